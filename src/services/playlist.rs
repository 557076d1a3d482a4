//! M3U playlist export

use std::io::Write;

use crate::error::{CatalogError, CatalogResult};
use crate::models::ProviderMap;
use crate::services::aggregator::sorted_keys;

/// Write an M3U playlist for `provider_keys`
///
/// Providers are written in display order and channels by title. Attribute
/// values go out verbatim (a `"` in a title breaks that entry's attributes).
pub fn render_playlist<W, F>(
    buckets: &ProviderMap,
    provider_keys: &[String],
    resolve_url: F,
    out: &mut W,
) -> CatalogResult<()>
where
    W: Write,
    F: Fn(&str) -> String,
{
    let keys: Vec<String> = sorted_keys(buckets)
        .into_iter()
        .filter(|key| provider_keys.contains(key))
        .collect();

    if keys.is_empty() {
        return Err(CatalogError::no_providers());
    }

    out.write_all(b"#EXTM3U")?;

    for key in &keys {
        let provider = &buckets[key];

        for channel in provider.sorted_channels() {
            write!(
                out,
                "\n#EXTINF:-1 tvg-id=\"{id}\" tvg-name=\"{name}\" tvg-logo=\"{logo}\" group-title=\"{group}\",{name}\n{url}",
                id = channel.id,
                name = channel.title,
                logo = channel.thumb.as_deref().unwrap_or(""),
                group = provider.name,
                url = resolve_url(&channel.id),
            )?;
        }
    }

    Ok(())
}
