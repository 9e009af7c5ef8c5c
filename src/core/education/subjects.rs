//! Subject and topic catalog
//!
//! The curriculum the assistant knows about: six subjects, each with grade
//! levels and a handful of topics.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Beginner => "入门",
            Self::Intermediate => "进阶",
            Self::Advanced => "高级",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    /// Minutes
    pub estimated_time: u32,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub levels: Vec<String>,
    pub topics: Vec<Topic>,
}

impl Subject {
    pub fn topic(&self, topic_id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == topic_id)
    }

    /// Sum of topic estimates, in minutes
    pub fn total_time(&self) -> u32 {
        self.topics.iter().map(|t| t.estimated_time).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningObjective {
    pub primary: String,
    pub skills: Vec<String>,
}

static SUBJECTS: OnceLock<Vec<Subject>> = OnceLock::new();

/// All subjects, in display order
pub fn subjects() -> &'static [Subject] {
    SUBJECTS.get_or_init(build_subjects)
}

pub fn find_subject(id: &str) -> Option<&'static Subject> {
    subjects().iter().find(|s| s.id == id)
}

pub fn learning_objective(subject_id: &str) -> Option<LearningObjective> {
    let (primary, skills): (&str, [&str; 4]) = match subject_id {
        "chinese" => (
            "培养中文语言文学素养，提高阅读理解和写作能力",
            ["阅读理解", "写作表达", "文学鉴赏", "语言运用"],
        ),
        "math" => (
            "建立数学思维，掌握数学基础知识和解题方法",
            ["逻辑推理", "计算能力", "空间想象", "问题解决"],
        ),
        "math-competition" => (
            "培养数学竞赛能力，冲击各类数学竞赛奖项",
            ["高级数学思维", "竞赛技巧", "创新解题", "时间管理"],
        ),
        "english" => (
            "全面提升英语听说读写能力，培养国际视野",
            ["听力理解", "口语表达", "阅读能力", "写作技巧"],
        ),
        "science" => (
            "培养科学思维和探索精神，理解自然规律",
            ["观察能力", "实验技能", "科学推理", "创新思维"],
        ),
        "arts" => (
            "培养艺术审美和创作能力，提升综合素养",
            ["审美能力", "创意思维", "表达技巧", "文化理解"],
        ),
        _ => return None,
    };
    Some(LearningObjective {
        primary: primary.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
    })
}

fn topic(id: &str, name: &str, description: &str, difficulty: Difficulty, estimated_time: u32) -> Topic {
    Topic {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        difficulty,
        estimated_time,
        prerequisites: Vec::new(),
    }
}

fn subject(id: &str, name: &str, description: &str, icon: &str, color: &str, levels: &[&str], topics: Vec<Topic>) -> Subject {
    Subject {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        levels: levels.iter().map(|l| l.to_string()).collect(),
        topics,
    }
}

fn build_subjects() -> Vec<Subject> {
    use Difficulty::*;

    let school = &["小学", "初中", "高中"];
    vec![
        subject("chinese", "语文", "中文语言文学学习", "📚", "red", school, vec![
            topic("poetry", "古诗词", "古典诗词赏析与背诵", Intermediate, 45),
            topic("composition", "作文写作", "记叙文、议论文、说明文写作技巧", Intermediate, 60),
            topic("reading", "阅读理解", "文章理解与分析能力培养", Beginner, 30),
        ]),
        subject("math", "数学", "数学基础与应用", "🔢", "blue", school, vec![
            topic("arithmetic", "基础运算", "加减乘除与四则运算", Beginner, 30),
            topic("algebra", "代数", "方程式与不等式", Intermediate, 45),
            topic("geometry", "几何", "平面与立体几何", Intermediate, 50),
        ]),
        subject("math-competition", "奥数竞赛", "数学竞赛专项训练", "🏆", "gold", &["小学组", "初中组", "高中组"], vec![
            topic("number-theory", "数论", "质数、最大公约数、同余理论", Advanced, 90),
            topic("combinatorics", "组合数学", "排列组合、概率统计", Advanced, 75),
            topic("competition-geometry", "竞赛几何", "几何证明与构造", Advanced, 80),
        ]),
        subject("english", "英语", "英语语言学习", "🌍", "green", school, vec![
            topic("vocabulary", "词汇积累", "单词记忆与应用", Beginner, 25),
            topic("grammar", "语法学习", "英语语法规则与应用", Intermediate, 40),
            topic("speaking", "口语练习", "英语口语表达能力", Intermediate, 35),
        ]),
        subject("science", "科学", "自然科学综合学习", "🔬", "purple", school, vec![
            topic("physics", "物理", "物理现象与规律", Intermediate, 50),
            topic("chemistry", "化学", "化学反应与元素", Intermediate, 45),
            topic("biology", "生物", "生命科学基础", Beginner, 40),
        ]),
        subject("arts", "艺术", "艺术创作与欣赏", "🎨", "pink", &["启蒙", "基础", "进阶"], vec![
            topic("drawing", "绘画", "素描、色彩、创意绘画", Beginner, 60),
            topic("music", "音乐", "音乐理论与欣赏", Beginner, 45),
            topic("design", "设计", "创意设计思维培养", Intermediate, 55),
        ]),
    ]
}
