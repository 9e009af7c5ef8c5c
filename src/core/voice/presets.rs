//! Built-in Voice Catalog
//!
//! The teacher personas and teaching modes shipped with the assistant.
//! Built once per process and shared.

use std::sync::{Arc, OnceLock};

use super::profiles::{
    AgeGroup, DetailLevel, Gender, ResponseTime, TeachingMode, VoiceCatalog, VoiceProfile,
};
use super::types::{VoiceSettings, VoiceSettingsPatch};

/// Profile selected when nothing has been persisted yet
pub const DEFAULT_PROFILE_KEY: &str = "teacher_female";

/// Reserved key meaning "use the custom slider settings"
pub const CUSTOM_PROFILE_KEY: &str = "custom";

static BUILTIN: OnceLock<Arc<VoiceCatalog>> = OnceLock::new();

/// Shared handle to the built-in catalog
pub fn builtin_catalog() -> Arc<VoiceCatalog> {
    BUILTIN.get_or_init(|| Arc::new(build_catalog())).clone()
}

fn build_catalog() -> VoiceCatalog {
    VoiceCatalog::new()
        // =====================================================================
        // Teacher personas
        // =====================================================================
        .with_profile(
            "teacher_female",
            VoiceProfile::new("温柔女老师", Gender::Female, AgeGroup::Adult, VoiceSettings::new(0.9, 1.1, 0.8))
                .with_description("亲切耐心的女老师，语速适中，适合语文、英语和艺术课程")
                .with_subjects(&["chinese", "english", "arts", "history"]),
        )
        .with_profile(
            "teacher_male",
            VoiceProfile::new("沉稳男老师", Gender::Male, AgeGroup::Adult, VoiceSettings::new(0.9, 0.9, 0.85))
                .with_description("逻辑清晰的男老师，适合数学、科学和编程讲解")
                .with_subjects(&["math", "math-competition", "science", "programming"]),
        )
        .with_profile(
            "young_female",
            VoiceProfile::new("活泼小姐姐", Gender::Female, AgeGroup::Young, VoiceSettings::new(1.0, 1.2, 0.8))
                .with_description("年轻活泼的声音，适合低年级学生和启蒙课程")
                .with_subjects(&["english", "arts"]),
        )
        .with_profile(
            "narrator",
            VoiceProfile::new("故事讲述者", Gender::Neutral, AgeGroup::Adult, VoiceSettings::new(0.8, 1.0, 0.9))
                .with_description("平稳舒缓的讲述声音，适合古诗词朗读和历史故事")
                .with_subjects(&["chinese", "history"]),
        )
        // =====================================================================
        // Teaching modes
        // =====================================================================
        .with_mode(
            "fast",
            TeachingMode {
                name: "快速问答".to_string(),
                description: "简洁直接的回答，快速解决问题".to_string(),
                response_time: ResponseTime::Instant,
                detail_level: DetailLevel::Brief,
                voice_settings: VoiceSettingsPatch::rate(1.2).with_pitch(1.0),
            },
        )
        .with_mode(
            "deep",
            TeachingMode {
                name: "深度讲解".to_string(),
                description: "详细的分步讲解，帮助理解原理".to_string(),
                response_time: ResponseTime::Thoughtful,
                detail_level: DetailLevel::Detailed,
                voice_settings: VoiceSettingsPatch::rate(0.8).with_pitch(0.95),
            },
        )
        .with_mode(
            "interactive",
            TeachingMode {
                name: "互动引导".to_string(),
                description: "通过提问引导学生思考".to_string(),
                response_time: ResponseTime::Normal,
                detail_level: DetailLevel::Standard,
                voice_settings: VoiceSettingsPatch::rate(1.0).with_pitch(1.1),
            },
        )
        .with_mode(
            "practice",
            TeachingMode {
                name: "练习模式".to_string(),
                description: "出题练习并给出反馈".to_string(),
                response_time: ResponseTime::Normal,
                detail_level: DetailLevel::Standard,
                voice_settings: VoiceSettingsPatch::rate(0.9).with_volume(0.9),
            },
        )
}
