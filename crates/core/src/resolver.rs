use chrono::NaiveDate;
use tracing::trace;

use crate::catalog::LocationCatalog;
use crate::config::ResolverConfig;
use crate::dates::extract_date;
use crate::models::ParsedQueryIntent;
use crate::normalize::{fold_text, is_unaccented, lower_text, tokenize};

/// Written with their tone marks. Once folded, `về`/`tới` collide with the
/// everyday words `vé` (ticket) and `tôi` (I).
const ORIGIN_MARKERS: &[&str] = &["từ", "from"];
const DESTINATION_MARKERS: &[&str] = &["đến", "tới", "to", "về", "đi", "sang"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Origin,
    Destination,
}

/// One word of the message: as written (lower-cased) and folded.
#[derive(Debug, Clone)]
struct Word {
    written: String,
    folded: String,
}

#[derive(Debug, Clone, Copy)]
struct Mention {
    location: usize,
    first_token: usize,
    token_len: usize,
    marker: Option<Role>,
}

/// Turns free text into a scored flight-search intent. Holds no state besides
/// its configuration, so one instance can serve any number of callers.
#[derive(Debug, Clone, Default)]
pub struct QueryResolver {
    config: ResolverConfig,
}

impl QueryResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve(
        &self,
        text: &str,
        catalog: &LocationCatalog,
        today: NaiveDate,
    ) -> ParsedQueryIntent {
        let written = lower_text(text);
        let words = split_words(&written);
        if words.is_empty() {
            return ParsedQueryIntent::empty();
        }

        // Text typed without any diacritics can only be read by its folded form.
        let plain = is_unaccented(&written);
        let mentions = collect_mentions(&words, plain, catalog);
        let (origin, destination) = assign_roles(&mentions);
        let code_of = |mention: Option<usize>| {
            mention
                .and_then(|idx| catalog.locations().get(mentions[idx].location))
                .map(|location| location.code.clone())
        };

        let origin_code = code_of(origin);
        let destination_code = code_of(destination);
        let departure_date = extract_date(&fold_text(&written), today);

        let mut intent = ParsedQueryIntent {
            origin_code,
            destination_code,
            departure_date,
            ..ParsedQueryIntent::empty()
        };

        let located = intent.has_any_location();
        let mut score = 0.0;
        if intent.origin_code.is_some() {
            score += self.config.origin_weight;
        }
        if intent.destination_code.is_some() {
            score += self.config.destination_weight;
        }
        // A date on its own says nothing about a flight.
        if located && intent.departure_date.is_some() {
            score += self.config.date_weight;
        }

        let max = self.config.max_weight();
        let confidence = if max > 0.0 {
            (score / max).clamp(0.0, 1.0)
        } else {
            0.0
        };

        intent.confidence = confidence;
        intent.is_valid = located && confidence >= self.config.min_confidence;

        trace!(
            mentions = mentions.len(),
            plain,
            origin = ?intent.origin_code,
            destination = ?intent.destination_code,
            date = ?intent.departure_date,
            confidence,
            "query resolved"
        );

        intent
    }
}

/// Resolves with the default configuration.
pub fn parse_flight_search_query(
    text: &str,
    catalog: &LocationCatalog,
    today: NaiveDate,
) -> ParsedQueryIntent {
    QueryResolver::default().resolve(text, catalog, today)
}

fn split_words(written: &str) -> Vec<Word> {
    tokenize(written)
        .into_iter()
        .map(|token| Word {
            written: token.text.to_string(),
            folded: fold_text(token.text),
        })
        .collect()
}

/// Every whole-word occurrence of a catalog needle. Overlaps go to the longer
/// needle, then to the earlier catalog entry.
fn collect_mentions(words: &[Word], plain: bool, catalog: &LocationCatalog) -> Vec<Mention> {
    let mut candidates = Vec::new();

    for needle in catalog.needles() {
        let width = needle.tokens.len();
        if width == 0 || width > words.len() {
            continue;
        }
        for start in 0..=words.len() - width {
            let window = &words[start..start + width];
            if window
                .iter()
                .zip(&needle.tokens)
                .all(|(word, expected)| word.folded == *expected)
            {
                candidates.push(Mention {
                    location: needle.location_index,
                    first_token: start,
                    token_len: width,
                    marker: marker_before(words, start, plain),
                });
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.token_len
            .cmp(&a.token_len)
            .then(a.location.cmp(&b.location))
            .then(a.first_token.cmp(&b.first_token))
    });

    let mut taken = vec![false; words.len()];
    let mut mentions = Vec::new();
    for candidate in candidates {
        let span = candidate.first_token..candidate.first_token + candidate.token_len;
        if span.clone().any(|idx| taken[idx]) {
            continue;
        }
        for idx in span {
            taken[idx] = true;
        }
        mentions.push(candidate);
    }

    mentions.sort_by_key(|mention| mention.first_token);
    mentions
}

/// Accented text must spell the marker with its tone marks. Plain text is
/// compared folded, where `ve` may be either `vé` or `về`.
fn marker_before(words: &[Word], start: usize, plain: bool) -> Option<Role> {
    let previous = words.get(start.checked_sub(1)?)?;
    let is_marker = |markers: &[&str]| {
        markers.iter().any(|marker| {
            if plain {
                fold_text(marker) == previous.folded
            } else {
                *marker == previous.written
            }
        })
    };

    if is_marker(ORIGIN_MARKERS) {
        Some(Role::Origin)
    } else if is_marker(DESTINATION_MARKERS) {
        Some(Role::Destination)
    } else {
        None
    }
}

/// Marker words win over position. Whatever is left fills origin first, then
/// destination, in reading order.
fn assign_roles(mentions: &[Mention]) -> (Option<usize>, Option<usize>) {
    let mut origin = mentions
        .iter()
        .position(|mention| mention.marker == Some(Role::Origin));
    let mut destination = mentions
        .iter()
        .enumerate()
        .position(|(idx, mention)| {
            mention.marker == Some(Role::Destination) && Some(idx) != origin
        });

    for idx in 0..mentions.len() {
        if Some(idx) == origin || Some(idx) == destination {
            continue;
        }
        if origin.is_none() {
            origin = Some(idx);
        } else if destination.is_none() {
            destination = Some(idx);
        }
    }

    (origin, destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    fn catalog() -> LocationCatalog {
        LocationCatalog::new(vec![
            Location::new("SGN", "Hồ Chí Minh", &["Sài Gòn"]),
            Location::new("HAN", "Hà Nội", &["Nội Bài"]),
            Location::new("DAD", "Đà Nẵng", &[]),
        ])
        .unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 19).unwrap()
    }

    fn resolve(text: &str) -> ParsedQueryIntent {
        parse_flight_search_query(text, &catalog(), today())
    }

    #[test]
    fn full_vietnamese_query() {
        let intent = resolve("tìm chuyến bay từ SGN đến HAN ngày 2025-12-01");
        assert_eq!(intent.origin_code.as_deref(), Some("SGN"));
        assert_eq!(intent.destination_code.as_deref(), Some("HAN"));
        assert_eq!(intent.departure_date, NaiveDate::from_ymd_opt(2025, 12, 1));
        assert!((intent.confidence - 1.0).abs() < 1e-9);
        assert!(intent.is_valid);
    }

    #[test]
    fn markers_override_reading_order() {
        let intent = resolve("đến Hà Nội từ Sài Gòn");
        assert_eq!(intent.origin_code.as_deref(), Some("SGN"));
        assert_eq!(intent.destination_code.as_deref(), Some("HAN"));

        let intent = resolve("fly to HAN from DAD");
        assert_eq!(intent.origin_code.as_deref(), Some("DAD"));
        assert_eq!(intent.destination_code.as_deref(), Some("HAN"));
    }

    #[test]
    fn reading_order_without_markers() {
        let intent = resolve("SGN HAN");
        assert_eq!(intent.origin_code.as_deref(), Some("SGN"));
        assert_eq!(intent.destination_code.as_deref(), Some("HAN"));
    }

    #[test]
    fn single_location_is_not_actionable() {
        let intent = resolve("bay đến Đà Nẵng");
        assert_eq!(intent.origin_code, None);
        assert_eq!(intent.destination_code.as_deref(), Some("DAD"));
        assert!((intent.confidence - 0.4).abs() < 1e-9);
        assert!(!intent.is_valid);

        let intent = resolve("Đà Nẵng");
        assert_eq!(intent.origin_code.as_deref(), Some("DAD"));
        assert_eq!(intent.destination_code, None);
    }

    #[test]
    fn accented_lookalikes_are_not_markers() {
        let catalog = LocationCatalog::builtin();
        let resolve = |text: &str| parse_flight_search_query(text, &catalog, today());

        let intent = resolve("mua vé SGN HAN ngày 2025-12-01");
        assert_eq!(intent.origin_code.as_deref(), Some("SGN"));
        assert_eq!(intent.destination_code.as_deref(), Some("HAN"));

        let intent = resolve("đặt vé Hà Nội đi Sài Gòn");
        assert_eq!(intent.origin_code.as_deref(), Some("HAN"));
        assert_eq!(intent.destination_code.as_deref(), Some("SGN"));

        let intent = resolve("cho tôi SGN HAN");
        assert_eq!(intent.origin_code.as_deref(), Some("SGN"));
        assert_eq!(intent.destination_code.as_deref(), Some("HAN"));

        let intent = resolve("bay về Hà Nội từ Đà Nẵng");
        assert_eq!(intent.origin_code.as_deref(), Some("DAD"));
        assert_eq!(intent.destination_code.as_deref(), Some("HAN"));
    }

    #[test]
    fn unaccented_text_uses_folded_markers() {
        let intent = resolve("bay tu Sai Gon den Ha Noi");
        assert_eq!(intent.origin_code.as_deref(), Some("SGN"));
        assert_eq!(intent.destination_code.as_deref(), Some("HAN"));

        let intent = resolve("ve Da Nang tu HAN");
        assert_eq!(intent.origin_code.as_deref(), Some("HAN"));
        assert_eq!(intent.destination_code.as_deref(), Some("DAD"));
    }

    #[test]
    fn same_location_twice_fills_both_roles() {
        let intent = resolve("từ HAN đến Hà Nội");
        assert_eq!(intent.origin_code.as_deref(), Some("HAN"));
        assert_eq!(intent.destination_code.as_deref(), Some("HAN"));
    }

    #[test]
    fn date_without_location_scores_zero() {
        let intent = resolve("ngày mai đi đâu đó");
        assert_eq!(intent.confidence, 0.0);
        assert!(!intent.is_valid);
    }

    #[test]
    fn longer_alias_beats_code_inside_it() {
        let catalog = LocationCatalog::new(vec![
            Location::new("NOI", "Nội", &[]),
            Location::new("HAN", "Hà Nội", &[]),
        ])
        .unwrap();
        let intent = parse_flight_search_query("bay ra Hà Nội", &catalog, today());
        assert_eq!(intent.origin_code.as_deref(), Some("HAN"));
    }

    #[test]
    fn ambiguous_alias_goes_to_first_catalog_entry() {
        let catalog = LocationCatalog::new(vec![
            Location::new("SGN", "Hồ Chí Minh", &["miền nam"]),
            Location::new("VCA", "Cần Thơ", &["miền nam"]),
        ])
        .unwrap();
        let intent = parse_flight_search_query("bay về miền nam", &catalog, today());
        assert_eq!(intent.destination_code.as_deref(), Some("SGN"));
    }

    #[test]
    fn custom_threshold_changes_validity_only() {
        let resolver = QueryResolver::new(ResolverConfig {
            min_confidence: 0.9,
            ..ResolverConfig::default()
        });
        let intent = resolver.resolve("bay từ SGN đến HAN", &catalog(), today());
        assert!(intent.has_both_locations());
        assert!(!intent.is_valid);
    }

    #[test]
    fn blank_input_is_empty_intent() {
        assert_eq!(resolve("   ?!  "), ParsedQueryIntent::empty());
    }
}
