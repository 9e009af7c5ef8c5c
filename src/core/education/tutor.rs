//! Canned-answer tutor
//!
//! No inference happens here. Each subject family has a small set of answer
//! templates; one is chosen with a seeded RNG so a given seed always
//! produces the same conversation.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::subjects::find_subject;

/// Simulated thinking time before an answer is returned
pub const DEFAULT_RESPONSE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionDifficulty {
    #[default]
    Basic,
    Intermediate,
    Advanced,
    Competition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub subject: String,
    pub topic: String,
    pub question: String,
    #[serde(default)]
    pub difficulty: QuestionDifficulty,
    #[serde(default)]
    pub student_level: String,
}

impl QuestionRequest {
    pub fn new(subject: &str, topic: &str, question: &str) -> Self {
        Self {
            subject: subject.to_string(),
            topic: topic.to_string(),
            question: question.to_string(),
            difficulty: QuestionDifficulty::default(),
            student_level: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorResponse {
    pub answer: String,
    pub explanation: String,
    pub related_topics: Vec<String>,
    pub next_steps: Vec<String>,
    /// 0.85 - 0.95
    pub confidence: f32,
}

/// Which template set answers a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Competition,
    Chinese,
    Programming,
    History,
    General,
}

impl Family {
    fn for_subject(subject_id: &str) -> Self {
        match subject_id {
            "math-competition" => Self::Competition,
            "chinese" => Self::Chinese,
            "programming" => Self::Programming,
            "history" => Self::History,
            _ => Self::General,
        }
    }

    fn templates(self) -> &'static [&'static str] {
        match self {
            Self::Competition => &[
                "🏆 **竞赛解题指导**\n\n这道题考查的是{topic}的核心思想。\n\n**思路：**\n1. 读清条件，找出隐含信息\n2. 选定方法：列方程、画图或找规律\n3. 逐步推理，每一步都要站得住\n4. 回头验算\n\n多练同类题，解题直觉会慢慢建立起来。",
                "🎯 **竞赛专项训练**\n\n这是{topic}里的经典题型。\n\n**要点：**\n• 基础理论要扎实\n• 方法选择要灵活\n• 计算过程要准确\n\n竞赛考的不只是知识，更是思维。",
            ],
            Self::Chinese => &[
                "📚 **语文学习指导**\n\n关于{topic}：\n\n**要点：**\n• 积累字词和名句\n• 坚持每天阅读\n• 多写多改\n\n语文靠的是长期积累，贵在坚持。",
                "✍️ **语文素养提升**\n\n{topic}重在理解与表达：先读懂文意，再用自己的话讲出来，最后落到笔头上。",
            ],
            Self::Programming => &[
                "💻 **编程启蒙**\n\n学习{topic}，先从分解问题开始：把大问题拆成小步骤，每一步写成一段代码。\n\n从小程序做起，逐步挑战更复杂的项目。",
                "🎯 **计算思维**\n\n{topic}练的是四种思维：分解、抽象、算法、模式识别。从游戏和动画这类有趣的小项目入手最容易坚持。",
            ],
            Self::History => &[
                "🏛️ **历史学习**\n\n学习{topic}，先理清时间线，再分析事件的前因后果，最后想一想它对今天的启示。",
                "📜 **文化传承**\n\n{topic}承载着前人的智慧。以史为鉴，才能更好地面向未来。",
            ],
            Self::General => &[
                "📖 **学习指导**\n\n关于{topic}的问题，这个知识点在{subject}中很重要。\n\n**建议：**\n1. 理解基本概念\n2. 通过练习加深理解\n3. 联系实际应用\n4. 定期复习巩固\n\n遇到困难不要气馁，有问题随时问我！",
            ],
        }
    }

    fn explanation(self, subject_name: &str) -> String {
        match self {
            Self::Competition => "这是一道典型的竞赛题，需要综合运用数学思维和解题技巧。".to_string(),
            Self::Chinese => "语文学习重在积累和理解，培养语言文字运用能力。".to_string(),
            Self::Programming => "编程学习重在培养逻辑思维和解决问题的能力。".to_string(),
            Self::History => "学习历史有助于了解过去、理解现在、思考未来。".to_string(),
            Self::General => format!("这是{subject_name}学科的重要知识点，需要理解和掌握。"),
        }
    }

    fn related_topics(self) -> Option<[&'static str; 3]> {
        match self {
            Self::Competition => Some(["数学思维", "解题策略", "竞赛技巧"]),
            Self::Chinese => Some(["语言文字", "文学素养", "表达能力"]),
            Self::Programming => Some(["逻辑思维", "算法设计", "问题分解"]),
            Self::History => Some(["历史文化", "时代背景", "历史思维"]),
            Self::General => None,
        }
    }

    fn next_steps(self) -> [&'static str; 4] {
        match self {
            Self::Competition => ["练习类似题型", "掌握解题方法", "参加模拟竞赛", "总结解题经验"],
            Self::Chinese => ["多读优秀作品", "练习写作表达", "积累词汇语句", "培养语感"],
            Self::Programming => ["理解基本概念", "动手实践编程", "参与项目练习", "培养计算思维"],
            Self::History => ["了解历史背景", "分析历史事件", "思考历史意义", "培养历史思维"],
            Self::General => ["理解基本概念", "练习相关题目", "总结知识要点", "应用到实际问题"],
        }
    }
}

pub struct Tutor {
    rng: StdRng,
    delay: Duration,
}

impl Tutor {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            delay: DEFAULT_RESPONSE_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Produce an answer immediately
    pub fn answer(&mut self, request: &QuestionRequest) -> TutorResponse {
        let family = Family::for_subject(&request.subject);
        let subject = find_subject(&request.subject);
        let subject_name = subject.map(|s| s.name.as_str()).unwrap_or(request.subject.as_str());
        let topic_name = subject
            .and_then(|s| s.topic(&request.topic))
            .map(|t| t.name.as_str())
            .unwrap_or(request.topic.as_str());

        let templates = family.templates();
        let template = templates[self.rng.gen_range(0..templates.len())];
        let answer = template
            .replace("{topic}", topic_name)
            .replace("{subject}", subject_name);

        let related_topics = match family.related_topics() {
            Some(fixed) => fixed.iter().map(|s| s.to_string()).collect(),
            None => subject
                .map(|s| s.topics.iter().take(3).map(|t| t.name.clone()).collect())
                .unwrap_or_default(),
        };

        TutorResponse {
            answer,
            explanation: family.explanation(subject_name),
            related_topics,
            next_steps: family.next_steps().iter().map(|s| s.to_string()).collect(),
            confidence: 0.85 + self.rng.gen::<f32>() * 0.1,
        }
    }

    /// Answer after the configured delay
    pub async fn ask(&mut self, request: &QuestionRequest) -> TutorResponse {
        tracing::debug!(subject = %request.subject, topic = %request.topic, "Tutor thinking");
        tokio::time::sleep(self.delay).await;
        self.answer(request)
    }
}
