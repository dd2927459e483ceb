use regex::Regex;
use tracing::warn;

/// Known English event names and their Chinese display names.
const BUILTIN_NAMES: &[(&str, &str)] = &[
    ("Heavensturn", "降神节"),
    ("Valentione's Day", "恋人节"),
    ("Little Ladies' Day", "女儿节"),
    ("Hatching-tide", "彩蛋狩猎"),
    ("The Make It Rain Campaign", "金蝶嘉年华"),
    ("Moonfire Faire", "红莲节"),
    ("The Rising", "新生庆典"),
    ("All Saints Wake", "守护天节"),
    ("Starlight Celebration", "星芒节"),
    ("The Moogle Treasure", "莫古莫古★大收集"),
    ("Maintenance", "维护"),
];

/// Numbered series, expanded with the captured number.
const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    (r"(?i)\bPVP\s*Series\s*(\d+)\b", "PVP第${1}赛季"),
    (r"(?i)\bLive\s*letter\s*(\d+)\b", "第${1}回制作人来信"),
];

/// Maps feed event names to display names. Applied once per event while the
/// index is built; names without a match pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    patterns: Vec<(Regex, String)>,
    // (lowercased key, display name), in lookup order
    names: Vec<(String, String)>,
}

impl Translator {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let patterns = BUILTIN_PATTERNS
            .iter()
            .filter_map(|(pattern, template)| match Regex::new(pattern) {
                Ok(re) => Some((re, template.to_string())),
                Err(e) => {
                    warn!(%pattern, error = %e, "dropping invalid name pattern");
                    None
                }
            })
            .collect();

        let names = BUILTIN_NAMES
            .iter()
            .map(|(en, zh)| (en.to_lowercase(), zh.to_string()))
            .collect();

        Self { patterns, names }
    }

    pub fn for_setting(translate_names: bool) -> Self {
        if translate_names {
            Self::builtin()
        } else {
            Self::identity()
        }
    }

    pub fn translate(&self, name: &str) -> String {
        if name.trim().is_empty() {
            return name.to_string();
        }
        let trimmed = name.trim();

        for (re, template) in &self.patterns {
            if let Some(caps) = re.captures(trimmed) {
                let mut out = String::new();
                caps.expand(template, &mut out);
                return out;
            }
        }

        if let Some(found) = self.exact(trimmed) {
            return found.to_string();
        }

        // "Event Name (Region)"
        if let Some(idx) = trimmed.find('(').filter(|&idx| idx > 0) {
            if let Some(found) = self.exact(trimmed[..idx].trim()) {
                return found.to_string();
            }
        }

        let lowered = trimmed.to_lowercase();
        self.names
            .iter()
            .find(|(key, _)| lowered.contains(key.as_str()))
            .map(|(_, display)| display.clone())
            .unwrap_or_else(|| name.to_string())
    }

    fn exact(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.names
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, display)| display.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_passes_through() {
        let t = Translator::identity();
        assert_eq!(t.translate("Moonfire Faire"), "Moonfire Faire");
    }

    #[test]
    fn exact_match_ignores_case() {
        let t = Translator::builtin();
        assert_eq!(t.translate("moonfire faire"), "红莲节");
        assert_eq!(t.translate("  Heavensturn "), "降神节");
    }

    #[test]
    fn numbered_series() {
        let t = Translator::builtin();
        assert_eq!(t.translate("PVP Series 9"), "PVP第9赛季");
        assert_eq!(t.translate("pvp series10"), "PVP第10赛季");
        assert_eq!(t.translate("Liveletter 89"), "第89回制作人来信");
        assert_eq!(t.translate("Live Letter 90"), "第90回制作人来信");
    }

    #[test]
    fn region_suffix_is_stripped() {
        let t = Translator::builtin();
        assert_eq!(t.translate("Starlight Celebration (EU)"), "星芒节");
    }

    #[test]
    fn substring_match() {
        let t = Translator::builtin();
        assert_eq!(t.translate("All Maintenance Complete"), "维护");
    }

    #[test]
    fn unknown_and_blank_names_unchanged() {
        let t = Translator::builtin();
        assert_eq!(t.translate("Fan Festival"), "Fan Festival");
        assert_eq!(t.translate("   "), "   ");
        assert_eq!(t.translate(""), "");
    }
}
