// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for the voice-line organizer

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Alias and rule tables
    #[serde(default)]
    pub tables: TableConfig,

    /// Classification and tree-building settings
    #[serde(default)]
    pub organize: OrganizeConfig,

    /// Transcription service settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TableConfig {
    #[serde(default = "default_alias_path")]
    pub aliases: PathBuf,
    #[serde(default = "default_topic_alias_path")]
    pub topic_aliases: PathBuf,
    /// Built-in rules are used when unset
    #[serde(default)]
    pub pattern_rules: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OrganizeConfig {
    #[serde(default = "default_audio_extensions")]
    pub audio_extensions: Vec<String>,
    #[serde(default)]
    pub exclude_regular_pings: bool,
    #[serde(default = "default_true")]
    pub disregard_unknown_speakers: bool,
    #[serde(default)]
    pub disregard_unknown_subjects: bool,
    /// Children of a `Self` node listed here come first, in this order
    #[serde(default = "default_self_priority")]
    pub self_priority: Vec<String>,
    #[serde(default = "default_self_keywords")]
    pub self_keywords: Vec<String>,
    #[serde(default = "default_special_categories")]
    pub special_categories: IndexMap<String, Vec<String>>,
    #[serde(default = "default_special_ping_categories")]
    pub special_ping_categories: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TranscriptionConfig {
    #[serde(default = "default_transcription_url")]
    pub url: String,
    #[serde(default = "default_transcription_model")]
    pub model: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Read before `OPENAI_API_KEY` and `~/.open_ai_key`
    #[serde(default)]
    pub api_key_file: Option<PathBuf>,
    #[serde(default)]
    pub custom_vocabulary: Option<PathBuf>,
}

// Default value functions
fn default_timeout() -> u64 { 120 }
fn default_retries() -> u32 { 3 }
fn default_workers() -> usize { 5 }
fn default_true() -> bool { true }
fn default_language() -> String { "en".to_string() }
fn default_transcription_model() -> String { "whisper-1".to_string() }
fn default_transcription_url() -> String {
    "https://api.openai.com/v1/audio/transcriptions".to_string()
}
fn default_alias_path() -> PathBuf { PathBuf::from("assets/character_mappings.json") }
fn default_topic_alias_path() -> PathBuf { PathBuf::from("assets/topic_mappings.json") }

fn default_audio_extensions() -> Vec<String> {
    vec!["mp3", "wav", "ogg", "flac", "m4a", "aac"]
        .into_iter().map(String::from).collect()
}

fn default_self_priority() -> Vec<String> {
    vec!["Select", "Unselect", "Pre game", "Post game"]
        .into_iter().map(String::from).collect()
}

fn default_self_keywords() -> Vec<String> {
    vec![
        "angry", "close_call", "concerned", "happy", "interrupt", "last_one_standing",
        "leave_base", "leaving_area", "parry", "near_miss", "melee_kill", "sad",
        "see_money", "select", "unselect", "killstreak_high", "killstreak_mid",
        "killstreak_start", "low_health_warning", "outnumbered", "pick_up_gold",
        "revenge_kill", "pick_up_rejuv", "upgrade_power1", "upgrade_power2",
        "upgrade_power3", "upgrade_power4", "use_power1", "use_power2", "use_power3",
        "use_power4", "solo_lasso_kill", "kill_anyhero", "use_power4_as_enemy",
        "desperation_power1", "desperation_power2", "desperation_power3",
        "desperation_power4", "hunt", "hs_select",
    ]
    .into_iter().map(String::from).collect()
}

fn category_table(groups: Vec<(&str, Vec<&str>)>) -> IndexMap<String, Vec<String>> {
    groups
        .into_iter()
        .map(|(name, keywords)| {
            (name.to_string(), keywords.into_iter().map(String::from).collect())
        })
        .collect()
}

fn default_special_categories() -> IndexMap<String, Vec<String>> {
    category_table(vec![
        ("Killstreaks", vec![
            "killstreak_high", "killstreak_mid", "killstreak_start", "killing_streak_high",
            "killing_streak_low", "killing_streak_medium", "killing_streak",
        ]),
        ("Movement", vec!["leave_base", "leaving_area"]),
        ("Use Power", vec![
            "use_power1", "use_power2", "use_power3", "use_power4", "bespoke_ability_line",
        ]),
        ("Desperation Use Power", vec![
            "desperation_power1", "desperation_power2", "desperation_power3", "desperation_power4",
        ]),
        ("Upgrade Power", vec![
            "upgrade_power1", "upgrade_power2", "upgrade_power3", "upgrade_power4",
        ]),
        ("Pick Up", vec!["see_money", "pick_up_gold", "pick_up_rejuv"]),
        ("Emotions", vec!["angry", "concerned", "happy", "sad"]),
        ("Combat", vec![
            "parry", "near_miss", "melee_kill", "revenge_kill", "last_one_standing",
            "close_call", "interrupt", "hunt", "kill_anyhero", "low_health_warning",
            "outnumbered", "solo_lasso_kill",
        ]),
    ])
}

fn default_special_ping_categories() -> IndexMap<String, Vec<String>> {
    category_table(vec![
        ("Objective Commands", vec![
            "attack_enemy", "clear_troopers", "defend_base", "defend_blue", "defend_green",
            "defend_purple", "defend_yellow", "help_with_idol", "lets_go_blue",
            "lets_go_green", "lets_go_purple", "lets_go_yellow", "push_blue", "push_green",
            "push_purple", "push_yellow", "take_mid", "take_shrine",
        ]),
        ("Ability Status/Usage", vec![
            "ability1_almost_ready", "ability1_not_ready", "ability2_almost_ready",
            "ability2_not_ready", "ability3_almost_ready", "ability3_not_ready",
            "ability4_almost_ready", "ability4_not_ready", "use_ability1", "use_ability2",
            "use_ability3", "use_ability4",
        ]),
        ("Item Status/Usage", vec![
            "can_heal", "glitch_almost_ready", "glitch_not_ready", "heal_ready",
            "health_nova_almost_ready", "health_nova_not_ready", "item_almost_ready",
            "item_not_ready", "kncokdown_almost_ready", "knockdown_almost_ready",
            "kncokdown_not_ready", "knockdown_not_ready", "refresher_almost_ready",
            "refresher_not_ready", "silence_almost_ready", "silence_not_ready",
            "stim_pack_almost_ready", "stim_pack_not_ready", "warp_stone_almost_ready",
            "warp_stone_not_ready", "use_glitch", "use_health_nova", "use_item",
            "use_kncokdown", "use_knockdown", "use_refresher", "use_rupture", "use_silence",
            "use_stim_pack", "use_warp_stone",
        ]),
        ("Movement and Positioning", vec![
            "be_back_soon", "flank", "going_in", "going_shop", "headed_blue", "headed_green",
            "headed_purple", "headed_this_way", "headed_yellow", "leaving_area", "lets_hide",
            "meet_here", "on_way", "request_follow", "retreat", "returning_to_base",
            "right_back", "stay_together", "wait",
        ]),
        ("Enemy Information and Location", vec![
            "danger_area", "in_mid", "missing", "missing_blue", "missing_green",
            "missing_purple", "missing_yellow", "on_top_of_garage", "on_top_of_mid", "saw",
            "saw_them", "see", "see_enemy", "see_on_bridge", "see_on_roof", "theyre_in_mid",
            "theyre_on_top_of_garage", "theyre_on_top_of_mid", "theyre_under_garage",
            "they_were_here", "under_garage", "was_here",
        ]),
        ("Requests and Alerts", vec![
            "almost_respawn", "avatar_under_attack", "blue_help", "dead", "green_help",
            "need_cover", "need_heal", "need_help_blue", "need_help_green", "need_help_purple",
            "need_help_yellow", "purple_help", "t1_under_attack", "t2_under_attack",
            "yellow_help",
        ]),
        ("Tactical Communication", vec![
            "attack", "careful", "gank", "ignore", "need_plan", "no_teamfight",
            "press_advantage", "stun",
        ]),
        ("General Communication / Social", vec![
            "affermative", "good_game", "good_job", "negative", "nice_work", "sorry",
            "thanks", "thank_you", "welcome", "well_played", "with",
        ]),
        ("Miscellaneous Status", vec!["check_items", "jar_call", "rejuv_drop"]),
    ])
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            aliases: default_alias_path(),
            topic_aliases: default_topic_alias_path(),
            pattern_rules: None,
        }
    }
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            audio_extensions: default_audio_extensions(),
            exclude_regular_pings: false,
            disregard_unknown_speakers: true,
            disregard_unknown_subjects: false,
            self_priority: default_self_priority(),
            self_keywords: default_self_keywords(),
            special_categories: default_special_categories(),
            special_ping_categories: default_special_ping_categories(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            url: default_transcription_url(),
            model: default_transcription_model(),
            language: default_language(),
            workers: default_workers(),
            timeout_secs: default_timeout(),
            retries: default_retries(),
            api_key_file: None,
            custom_vocabulary: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| crate::OrganizerError::io(path, e))?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::OrganizerError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| crate::OrganizerError::io(path, e))?;
        Ok(())
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> crate::Result<()> {
        if self.transcription.workers == 0 {
            return Err(crate::OrganizerError::Config(
                "transcription.workers must be at least 1".to_string(),
            ));
        }
        if self.organize.audio_extensions.is_empty() {
            return Err(crate::OrganizerError::Config(
                "organize.audio_extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(&temp.path().join("absent.json")).unwrap();
        assert_eq!(config.transcription.workers, 5);
        assert!(config.organize.disregard_unknown_speakers);
        assert_eq!(config.organize.self_priority[0], "Select");
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"organize": {"exclude_regular_pings": true}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert!(config.organize.exclude_regular_pings);
        assert_eq!(
            config.organize.special_categories.keys().next().map(String::as_str),
            Some("Killstreaks")
        );
        assert!(config.tables.pattern_rules.is_none());
    }

    #[test]
    fn test_malformed_config_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(crate::OrganizerError::Config(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        let mut config = AppConfig::default();
        config.transcription.workers = 2;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.transcription.workers, 2);
        assert_eq!(
            loaded.organize.special_ping_categories.len(),
            config.organize.special_ping_categories.len()
        );
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());
        config.transcription.workers = 0;
        assert!(config.validate().is_err());
    }
}
