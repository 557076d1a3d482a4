//! Provider aggregation
//!
//! Groups the flat channel listing into provider buckets. Pure functions
//! only; callers fetch the channels and pass the settings in.

use chrono::TimeZone;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::config::Settings;
use crate::models::{Channel, ProviderBucket, ProviderMap};

/// Key of the synthetic bucket holding every channel
pub const ALL: &str = "all";
/// Built-in provider for free-to-air channels
pub const PUBLIC: &str = "public";
/// Built-in provider for user-added channels
pub const CUSTOM: &str = "custom";

const SORT_ALL: u8 = 0;
const SORT_PROVIDER: u8 = 1;
const SORT_BUILTIN: u8 = 2;

lazy_static! {
    /// Leading channel number such as "7.1" in "7.1 Seven"
    static ref LEADING_NUMBER_REGEX: Regex = Regex::new(r"^[0-9]+\.[0-9]+").unwrap();

    static ref PROVIDER_ART: HashMap<&'static str, &'static str> = HashMap::from([
        (PUBLIC, "https://images.stremium.com/providers/public.png"),
        (CUSTOM, "https://images.stremium.com/providers/custom.png"),
        ("pluto tv", "https://images.stremium.com/providers/plutotv.png"),
        ("samsung tv plus", "https://images.stremium.com/providers/samsungtvplus.png"),
        ("plex", "https://images.stremium.com/providers/plex.png"),
        ("stirr", "https://images.stremium.com/providers/stirr.png"),
        ("xumo", "https://images.stremium.com/providers/xumo.png"),
    ]);
}

/// Options controlling a single aggregation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Add the synthetic "All" bucket
    pub include_all: bool,
    pub hide_public: bool,
    pub hide_custom: bool,
    pub strip_leading_number: bool,
}

impl AggregateOptions {
    /// Interactive browsing: "All" bucket plus the visibility filters
    pub fn browse(settings: &Settings) -> Self {
        Self {
            include_all: true,
            hide_public: settings.hide_public,
            hide_custom: settings.hide_custom,
            strip_leading_number: settings.remove_numbers,
        }
    }

    /// Playlist/guide export: every provider, no synthetic bucket
    pub fn export(settings: &Settings) -> Self {
        Self {
            include_all: false,
            hide_public: false,
            hide_custom: false,
            strip_leading_number: settings.remove_numbers,
        }
    }
}

fn is_builtin(key: &str) -> bool {
    key == PUBLIC || key == CUSTOM
}

/// Logo for a provider key, if we have one
pub fn provider_logo(key: &str) -> Option<String> {
    PROVIDER_ART.get(key).map(|url| url.to_string())
}

/// Remove a leading "digits.digits" channel number from a title
pub fn strip_leading_number(title: &str) -> String {
    LEADING_NUMBER_REGEX.replace(title, "").trim().to_string()
}

/// Group channels into provider buckets
pub fn aggregate(channels: &[Channel], options: AggregateOptions) -> ProviderMap {
    let mut providers = ProviderMap::new();

    if options.include_all {
        providers.insert(ALL.to_string(), ProviderBucket::new("All", None, SORT_ALL));
    }

    for channel in channels {
        let key = channel.provider_key();

        if (key == PUBLIC && options.hide_public) || (key == CUSTOM && options.hide_custom) {
            continue;
        }

        let mut channel = channel.clone();
        if options.strip_leading_number {
            channel.title = strip_leading_number(&channel.title);
        }

        if options.include_all {
            if let Some(all) = providers.get_mut(ALL) {
                all.channels.push(channel.clone());
            }
        }

        providers
            .entry(key)
            .or_insert_with_key(|key| {
                let sort = if is_builtin(key) { SORT_BUILTIN } else { SORT_PROVIDER };
                ProviderBucket::new(channel.provider_display_name.clone(), provider_logo(key), sort)
            })
            .channels
            .push(channel);
    }

    if options.include_all && providers.len() == 2 {
        providers.shift_remove(ALL);
    }

    providers
}

/// Provider keys in display order: `(sort, lower(name))`
pub fn sorted_keys(providers: &ProviderMap) -> Vec<String> {
    let mut keys: Vec<(&String, &ProviderBucket)> = providers.iter().collect();
    keys.sort_by_cached_key(|(_, bucket)| (bucket.sort, bucket.name.to_lowercase()));
    keys.into_iter().map(|(key, _)| key.clone()).collect()
}

/// Keep channels whose title contains `query` (case-insensitive)
pub fn filter_by_query<'a>(channels: Vec<&'a Channel>, query: &str) -> Vec<&'a Channel> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return channels;
    }

    channels
        .into_iter()
        .filter(|c| c.title.to_lowercase().contains(&query))
        .collect()
}

/// "[7:00pm - 7:30pm]\nNews" for the program currently airing, in `tz`
pub fn now_playing_in<Tz: TimeZone>(channel: &Channel, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match &channel.current_episode {
        Some(program) => {
            let start = program.start().with_timezone(tz);
            let stop = program.stop().with_timezone(tz);
            format!(
                "[{} - {}]\n{}",
                start.format("%-I:%M%P"),
                stop.format("%-I:%M%P"),
                program.title
            )
        }
        None => String::new(),
    }
}

/// Browse plot text in the server's local time
pub fn now_playing(channel: &Channel) -> String {
    now_playing_in(channel, &chrono::Local)
}
