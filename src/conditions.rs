//! # Condition Code Mapping
//!
//! Translates OpenWeatherMap condition identifiers into [`RenderAttributes`].
//!
//! Two static tables are consulted:
//! - **Sky table** (800–804): cloud size and sun size
//! - **Precipitation table** (2xx thunderstorm, 3xx drizzle, 5xx rain, 6xx snow):
//!   flake size/mask, drop size/mask and the thunder flag
//!
//! ## Resolution Order
//! A forecast point may carry codes from both tables. Precipitation is resolved
//! first and forces an overcast cloud (size 4). The sky table then supplies the
//! sun and only fills the cloud size when precipitation left it unset, so a
//! "clear sky" code never erases a storm cloud. Within one table the lowest
//! numeric code wins.

use crate::{ConditionCodeSet, RenderAttributes};

/// Cloud size forced by any precipitation.
pub const OVERCAST: u8 = 4;

/// Sky table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkyEntry {
    pub cloud_size: u8,
    pub sun_size: u8,
}

/// Precipitation table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrecipitationEntry {
    pub snow_size: u8,
    pub snow_mask: u8,
    pub rain_size: u8,
    pub rain_mask: u8,
    pub thunder: bool,
}

const fn sky(cloud_size: u8, sun_size: u8) -> SkyEntry {
    SkyEntry {
        cloud_size,
        sun_size,
    }
}

const fn precip(
    snow_size: u8,
    snow_mask: u8,
    rain_size: u8,
    rain_mask: u8,
    thunder: bool,
) -> PrecipitationEntry {
    PrecipitationEntry {
        snow_size,
        snow_mask,
        rain_size,
        rain_mask,
        thunder,
    }
}

/// Sorted by code.
const SKY_TABLE: &[(u32, SkyEntry)] = &[
    (800, sky(0, 2)), // clear sky
    (801, sky(1, 1)), // few clouds
    (802, sky(2, 1)), // scattered clouds
    (803, sky(3, 0)), // broken clouds
    (804, sky(4, 0)), // overcast clouds
];

// Mask layout:
//  1   4   2
//    8   16
/// Sorted by code.
const PRECIPITATION_TABLE: &[(u32, PrecipitationEntry)] = &[
    // Thunderstorm
    (200, precip(0, 0, 2, 3, true)),
    (201, precip(0, 0, 2, 3, true)),
    (202, precip(0, 0, 3, 27, true)),
    (210, precip(0, 0, 2, 3, true)),
    (211, precip(0, 0, 2, 3, true)),
    (212, precip(0, 0, 3, 27, true)),
    (221, precip(0, 0, 4, 27, true)),
    (230, precip(0, 0, 2, 3, true)),
    (231, precip(0, 0, 2, 3, true)),
    (232, precip(0, 0, 3, 27, true)),
    // Drizzle
    (300, precip(0, 0, 2, 3, false)),
    (301, precip(0, 0, 2, 3, false)),
    (302, precip(0, 0, 2, 31, false)),
    (310, precip(0, 0, 2, 7, false)),
    (311, precip(0, 0, 3, 7, false)),
    (312, precip(0, 0, 3, 31, false)),
    (313, precip(0, 0, 3, 7, false)),
    (314, precip(0, 0, 4, 31, false)),
    (321, precip(0, 0, 3, 7, false)),
    // Rain
    (500, precip(0, 0, 2, 7, false)),
    (501, precip(0, 0, 3, 7, false)),
    (502, precip(0, 0, 3, 31, false)),
    (503, precip(0, 0, 4, 31, false)),
    (504, precip(0, 0, 4, 31, false)),
    (511, precip(0, 0, 2, 31, false)),
    (520, precip(0, 0, 2, 3, false)),
    (521, precip(0, 0, 3, 7, false)),
    (522, precip(0, 0, 4, 31, false)),
    (531, precip(0, 0, 4, 31, false)),
    // Snow
    (600, precip(4, 7, 0, 0, false)),
    (601, precip(5, 7, 0, 0, false)),
    (602, precip(6, 31, 0, 0, false)),
    (611, precip(4, 3, 0, 0, false)),
    (612, precip(4, 7, 0, 0, false)),
    (613, precip(5, 7, 0, 0, false)),
    (615, precip(4, 2, 2, 1, false)),
    (616, precip(5, 7, 3, 24, false)),
    (620, precip(4, 3, 0, 0, false)),
    (621, precip(5, 7, 0, 0, false)),
    (622, precip(6, 31, 0, 0, false)),
];

fn lookup<T: Copy>(table: &[(u32, T)], code: u32) -> Option<T> {
    table
        .binary_search_by_key(&code, |(key, _)| *key)
        .ok()
        .map(|index| table[index].1)
}

/// Sky table lookup for a single code.
pub fn sky_entry(code: u32) -> Option<SkyEntry> {
    lookup(SKY_TABLE, code)
}

/// Precipitation table lookup for a single code.
pub fn precipitation_entry(code: u32) -> Option<PrecipitationEntry> {
    lookup(PRECIPITATION_TABLE, code)
}

/// Resolve a set of condition codes into render attributes.
///
/// Codes known to neither table are ignored; an empty or fully unknown set
/// yields blank attributes (only the time and temperature labels get drawn).
pub fn resolve(codes: &ConditionCodeSet) -> RenderAttributes {
    let mut attributes = RenderAttributes::default();

    if let Some(entry) = codes.iter().find_map(|&code| precipitation_entry(code)) {
        attributes.snow_size = entry.snow_size;
        attributes.snow_mask = entry.snow_mask;
        attributes.rain_size = entry.rain_size;
        attributes.rain_mask = entry.rain_mask;
        attributes.thunder = entry.thunder;
        attributes.cloud_size = OVERCAST;
    }

    if let Some(entry) = codes.iter().find_map(|&code| sky_entry(code)) {
        if attributes.cloud_size == 0 {
            attributes.cloud_size = entry.cloud_size;
        }
        attributes.sun_size = entry.sun_size;
    }

    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[u32]) -> ConditionCodeSet {
        list.iter().copied().collect()
    }

    #[test]
    fn test_tables_are_sorted() {
        assert!(SKY_TABLE.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(PRECIPITATION_TABLE.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_single_sky_code_matches_table() {
        for &(code, entry) in SKY_TABLE {
            let attrs = resolve(&codes(&[code]));
            assert_eq!(attrs.cloud_size, entry.cloud_size, "code {code}");
            assert_eq!(attrs.sun_size, entry.sun_size, "code {code}");
            assert_eq!(attrs.rain_mask, 0);
            assert_eq!(attrs.snow_mask, 0);
            assert!(!attrs.thunder);
        }
    }

    #[test]
    fn test_single_precipitation_code_forces_overcast() {
        for &(code, entry) in PRECIPITATION_TABLE {
            let attrs = resolve(&codes(&[code]));
            assert_eq!(attrs.cloud_size, OVERCAST, "code {code}");
            assert_eq!(attrs.sun_size, 0, "code {code}");
            assert_eq!(attrs.snow_size, entry.snow_size);
            assert_eq!(attrs.snow_mask, entry.snow_mask);
            assert_eq!(attrs.rain_size, entry.rain_size);
            assert_eq!(attrs.rain_mask, entry.rain_mask);
            assert_eq!(attrs.thunder, entry.thunder);
        }
    }

    #[test]
    fn test_snow_601() {
        let attrs = resolve(&codes(&[601]));
        assert_eq!(attrs.snow_size, 5);
        assert_eq!(attrs.snow_mask, 7);
        assert_eq!(attrs.cloud_size, 4);
        assert_eq!(attrs.rain_mask, 0);
        assert!(!attrs.thunder);
    }

    #[test]
    fn test_thunderstorm_200() {
        let attrs = resolve(&codes(&[200]));
        assert_eq!(attrs.rain_size, 2);
        assert_eq!(attrs.rain_mask, 3);
        assert!(attrs.thunder);
        assert_eq!(attrs.cloud_size, 4);
    }

    #[test]
    fn test_clear_sky_does_not_erase_storm_cloud() {
        let attrs = resolve(&codes(&[211, 800]));
        assert_eq!(attrs.cloud_size, OVERCAST);
        assert_eq!(attrs.sun_size, 2);
        assert!(attrs.thunder);
    }

    #[test]
    fn test_lowest_code_wins_within_table() {
        let attrs = resolve(&codes(&[502, 500]));
        assert_eq!(attrs.rain_size, 2);
        assert_eq!(attrs.rain_mask, 7);

        let attrs = resolve(&codes(&[804, 801]));
        assert_eq!(attrs.cloud_size, 1);
        assert_eq!(attrs.sun_size, 1);
    }

    #[test]
    fn test_empty_and_unknown_codes_are_blank() {
        assert!(resolve(&codes(&[])).is_blank());
        // Mist, haze and tornado are not drawn
        assert!(resolve(&codes(&[701, 721, 781])).is_blank());
    }

    #[test]
    fn test_unknown_codes_do_not_mask_known_ones() {
        let attrs = resolve(&codes(&[701, 803]));
        assert_eq!(attrs.cloud_size, 3);
        assert_eq!(attrs.sun_size, 0);
    }
}
