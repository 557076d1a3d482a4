//! XMLTV guide export

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use std::io::Write;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Program, ProviderMap};

const XMLTV_TIME_FORMAT: &str = "%Y%m%d%H%M%S %z";

fn xmltv_time(time: DateTime<Utc>) -> String {
    time.format(XMLTV_TIME_FORMAT).to_string()
}

fn write_programme<W: Write>(out: &mut W, channel_id: &str, program: &Program) -> std::io::Result<()> {
    if program.is_empty() {
        return Ok(());
    }

    write!(
        out,
        "<programme channel=\"{}\" start=\"{}\" stop=\"{}\"><title>{}</title>",
        channel_id,
        xmltv_time(program.start()),
        xmltv_time(program.stop()),
        escape(program.title.as_str()),
    )?;

    if let Some(subtitle) = program.episode_title.as_deref().filter(|s| !s.is_empty()) {
        write!(out, "<sub-title>{}</sub-title>", escape(subtitle))?;
    }

    if let Some(icon) = program.primary_image_url.as_deref().filter(|s| !s.is_empty()) {
        write!(out, "<icon src=\"{}\"/>", escape(icon))?;
    }

    let season = program.season_number.unwrap_or(0);
    let episode = program.episode_number.unwrap_or(0);
    if season > 0 && episode > 0 {
        write!(
            out,
            "<episode-num system=\"onscreen\">S{}E{}</episode-num>",
            season, episode
        )?;
    }

    if let Some(desc) = program.description.as_deref().filter(|s| !s.is_empty()) {
        write!(out, "<desc>{}</desc>", escape(desc))?;
    }

    out.write_all(b"</programme>")
}

/// Write an XMLTV document for `provider_keys`
///
/// Providers are written in the order given and channels in fetch order.
pub fn render_guide<W: Write>(
    buckets: &ProviderMap,
    provider_keys: &[String],
    out: &mut W,
) -> CatalogResult<()> {
    let providers: Vec<_> = provider_keys
        .iter()
        .filter_map(|key| buckets.get(key))
        .collect();

    if providers.is_empty() {
        return Err(CatalogError::no_providers());
    }

    out.write_all(br#"<?xml version="1.0" encoding="utf-8" ?><tv>"#)?;

    for provider in providers {
        for channel in &provider.channels {
            write!(out, "<channel id=\"{}\"></channel>", channel.id)?;

            if let Some(program) = &channel.current_episode {
                write_programme(out, &channel.id, program)?;
            }

            for program in &channel.upcoming_episodes {
                write_programme(out, &channel.id, program)?;
            }
        }
    }

    out.write_all(b"</tv>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Channel;
    use crate::services::aggregator::{aggregate, AggregateOptions};

    fn at(ts: &str) -> DateTime<Utc> {
        ts.parse().unwrap()
    }

    fn render(channels: &[Channel], keys: &[&str]) -> CatalogResult<String> {
        let buckets = aggregate(channels, AggregateOptions::default());
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let mut out = Vec::new();
        render_guide(&buckets, &keys, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_current_program_times() {
        let mut ch = Channel::new("news1", "News One", "Public");
        ch.current_episode = Some(Program::new("News", at("2024-01-01T00:00:00Z"), 30));

        let xml = render(&[ch], &["public"]).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\" ?><tv>\
             <channel id=\"news1\"></channel>\
             <programme channel=\"news1\" start=\"20240101000000 +0000\" stop=\"20240101003000 +0000\"><title>News</title></programme>\
             </tv>"
        );
    }

    #[test]
    fn test_offset_air_time_converted_to_utc() {
        let mut ch = Channel::new("c", "C", "P");
        let start: DateTime<Utc> = DateTime::parse_from_rfc3339("2024-01-01T10:00:00+10:00")
            .unwrap()
            .with_timezone(&Utc);
        ch.current_episode = Some(Program::new("Morning", start, 90));

        let xml = render(&[ch], &["p"]).unwrap();
        assert!(xml.contains("start=\"20240101000000 +0000\" stop=\"20240101013000 +0000\""));
    }

    #[test]
    fn test_optional_children_and_escaping() {
        let mut program = Program::new("Tom & Jerry <Classic>", at("2024-03-05T12:00:00Z"), 15);
        program.episode_title = Some("Cat & Mouse".to_string());
        program.primary_image_url = Some("http://img/x.png?a=1&b=2".to_string());
        program.season_number = Some(2);
        program.episode_number = Some(7);
        program.description = Some("Chase <again>".to_string());

        let mut ch = Channel::new("c", "C", "P");
        ch.upcoming_episodes.push(program);

        let xml = render(&[ch], &["p"]).unwrap();
        assert!(xml.contains(
            "<title>Tom &amp; Jerry &lt;Classic&gt;</title>\
             <sub-title>Cat &amp; Mouse</sub-title>\
             <icon src=\"http://img/x.png?a=1&amp;b=2\"/>\
             <episode-num system=\"onscreen\">S2E7</episode-num>\
             <desc>Chase &lt;again&gt;</desc></programme>"
        ));
    }

    #[test]
    fn test_episode_num_needs_both_numbers() {
        let mut program = Program::new("Show", at("2024-03-05T12:00:00Z"), 15);
        program.season_number = Some(0);
        program.episode_number = Some(3);

        let mut ch = Channel::new("c", "C", "P");
        ch.current_episode = Some(program);

        let xml = render(&[ch], &["p"]).unwrap();
        assert!(!xml.contains("episode-num"));
    }

    #[test]
    fn test_empty_programs_skipped() {
        let mut ch = Channel::new("c", "C", "P");
        ch.current_episode = Some(Program::new("", at("2024-03-05T12:00:00Z"), 15));
        ch.upcoming_episodes.push(Program::new("Next", at("2024-03-05T12:15:00Z"), 15));

        let xml = render(&[ch], &["p"]).unwrap();
        assert_eq!(xml.matches("<programme").count(), 1);
        assert!(xml.contains("<title>Next</title>"));
    }

    #[test]
    fn test_supplied_order_and_fetch_order() {
        let channels = vec![
            Channel::new("b", "Bravo", "One"),
            Channel::new("z", "Zulu", "Two"),
            Channel::new("a", "Alpha", "One"),
        ];

        let xml = render(&channels, &["two", "one"]).unwrap();
        let z = xml.find("id=\"z\"").unwrap();
        let b = xml.find("id=\"b\"").unwrap();
        let a = xml.find("id=\"a\"").unwrap();
        assert!(z < b && b < a);
    }

    #[test]
    fn test_no_matching_provider() {
        let channels = vec![Channel::new("a", "Alpha", "One")];
        let err = render(&channels, &["public"]).unwrap_err();
        assert!(matches!(err, CatalogError::Configuration(_)));
    }
}
