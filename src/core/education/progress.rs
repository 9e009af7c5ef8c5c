//! Learning progress tracking
//!
//! Records study sessions and summarizes a subject into strengths,
//! weaknesses and next-step recommendations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const STRENGTH_THRESHOLD: f32 = 80.0;
const WEAKNESS_THRESHOLD: f32 = 60.0;
const MAX_LISTED_TOPICS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningProgress {
    pub subject_id: String,
    pub topic_id: String,
    /// 0 - 100
    pub progress: u8,
    pub score: Option<f32>,
    /// Minutes
    pub time_spent: u32,
    pub last_studied: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressAnalysis {
    pub average_score: f32,
    pub total_time: u32,
    pub completed_topics: usize,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ProgressTracker {
    records: Vec<LearningProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a study session, stamped now
    pub fn record(&mut self, subject_id: &str, topic_id: &str, progress: u8, score: Option<f32>, time_spent: u32) {
        self.records.push(LearningProgress {
            subject_id: subject_id.to_string(),
            topic_id: topic_id.to_string(),
            progress: progress.min(100),
            score,
            time_spent,
            last_studied: Utc::now(),
        });
    }

    pub fn records(&self) -> &[LearningProgress] {
        &self.records
    }

    pub fn analyze(&self, subject_id: &str) -> ProgressAnalysis {
        let entries: Vec<&LearningProgress> = self
            .records
            .iter()
            .filter(|p| p.subject_id == subject_id)
            .collect();

        if entries.is_empty() {
            return ProgressAnalysis {
                average_score: 0.0,
                total_time: 0,
                completed_topics: 0,
                strengths: Vec::new(),
                weaknesses: Vec::new(),
                recommendations: vec![
                    "开始学习基础知识".to_string(),
                    "制定学习计划".to_string(),
                    "设定学习目标".to_string(),
                ],
            };
        }

        // Unscored sessions count as zero
        let score_of = |p: &LearningProgress| p.score.unwrap_or(0.0);
        let average_score = entries.iter().map(|p| score_of(p)).sum::<f32>() / entries.len() as f32;
        let total_time = entries.iter().map(|p| p.time_spent).sum();

        let strengths: Vec<String> = entries
            .iter()
            .filter(|p| score_of(p) >= STRENGTH_THRESHOLD)
            .map(|p| p.topic_id.clone())
            .take(MAX_LISTED_TOPICS)
            .collect();
        let weaknesses: Vec<String> = entries
            .iter()
            .filter(|p| score_of(p) < WEAKNESS_THRESHOLD)
            .map(|p| p.topic_id.clone())
            .take(MAX_LISTED_TOPICS)
            .collect();

        ProgressAnalysis {
            average_score,
            total_time,
            completed_topics: entries.len(),
            recommendations: recommendations(average_score, &weaknesses),
            strengths,
            weaknesses,
        }
    }
}

pub fn recommendations(average_score: f32, weaknesses: &[String]) -> Vec<String> {
    let band: [&str; 3] = if average_score < WEAKNESS_THRESHOLD {
        ["加强基础知识学习", "增加练习时间", "寻求老师或同学帮助"]
    } else if average_score < STRENGTH_THRESHOLD {
        ["巩固已学知识", "挑战更难的题目", "总结学习方法"]
    } else {
        ["保持学习状态", "拓展相关知识", "帮助其他同学"]
    };

    let mut out: Vec<String> = band.iter().map(|s| s.to_string()).collect();
    if !weaknesses.is_empty() {
        out.push(format!("重点关注：{}", weaknesses.join("、")));
    }
    out
}
