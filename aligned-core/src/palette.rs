use session::{PaletteSettings, Rgb, DEFAULT_CHANNEL_COLORS, DEFAULT_UNTAGGED_COLOR};
use std::collections::HashMap;

/// Colour assignment for channels and tags. Both cycle by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    channels: Vec<Rgb>,
    tags: Vec<Rgb>,
    pub untagged: Rgb,
    pub zero_line: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_settings(&PaletteSettings::default())
    }
}

impl Palette {
    pub fn from_settings(settings: &PaletteSettings) -> Self {
        Self::new(
            settings.channels.clone(),
            settings.tags.clone(),
            settings.untagged,
            settings.zero_line,
        )
    }

    pub fn new(channels: Vec<Rgb>, tags: Vec<Rgb>, untagged: Rgb, zero_line: Rgb) -> Self {
        let channels = if channels.is_empty() {
            DEFAULT_CHANNEL_COLORS.to_vec()
        } else {
            channels
        };
        Self {
            channels,
            tags,
            untagged,
            zero_line,
        }
    }

    pub fn channel_color(&self, index: usize) -> Rgb {
        self.channels[index % self.channels.len()]
    }

    pub fn tag_color(&self, index: usize) -> Rgb {
        if self.tags.is_empty() {
            return DEFAULT_UNTAGGED_COLOR;
        }
        self.tags[index % self.tags.len()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub name: String,
    pub color: Rgb,
}

/// One entry per channel. Missing names become `ch{i}`; repeats get a ` (n)` suffix.
pub fn legend_entries(names: &[String], channel_count: usize, palette: &Palette) -> Vec<LegendEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    (0..channel_count)
        .map(|idx| {
            let base = names
                .get(idx)
                .filter(|name| !name.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| format!("ch{idx}"));
            let seen = counts.entry(base.clone()).or_insert(0);
            *seen += 1;
            let name = if *seen == 1 {
                base
            } else {
                format!("{base} ({seen})")
            };
            LegendEntry {
                name,
                color: palette.channel_color(idx),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_colours_cycle() {
        let palette = Palette::default();
        assert_eq!(palette.channel_color(0), Rgb::new(0xF4, 0x43, 0x36));
        assert_eq!(palette.channel_color(6), palette.channel_color(0));
        assert_eq!(palette.channel_color(7), Rgb::new(0x4C, 0xAF, 0x50));
    }

    #[test]
    fn legend_fills_and_disambiguates_names() {
        let names = vec!["eeg".to_string(), "eeg".to_string(), String::new()];
        let legend = legend_entries(&names, 4, &Palette::default());
        let labels: Vec<&str> = legend.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(labels, vec!["eeg", "eeg (2)", "ch2", "ch3"]);
    }
}
