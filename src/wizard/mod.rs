use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::errors::ValidationError;

pub const BUDGET_MIN: u32 = 10_000;
pub const BUDGET_MAX: u32 = 500_000;
pub const BUDGET_DEFAULT: u32 = 50_000;
pub const BUDGET_PRESETS: &[u32] = &[30_000, 50_000, 100_000, 200_000, 500_000];

pub const RELATIONS: &[&str] = &["연인", "친구", "부모님", "형제자매", "직장 동료", "선생님"];
pub const GENDERS: &[&str] = &["남성", "여성"];
pub const AGES: &[&str] = &["10대", "20대", "30대", "40대", "50대", "60대 이상"];
pub const OCCASIONS: &[&str] = &["생일", "기념일", "집들이", "취업/승진", "감사 인사", "크리스마스"];
pub const INTERESTS: &[&str] = &[
    "패션", "뷰티", "테크/가전", "요리", "운동", "독서", "여행", "인테리어", "게임", "음악",
];

pub const DEFAULT_AGE: &str = "20대";

/// Everything the user has picked so far. Lives for one session and is never
/// cleared by a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub relation: String,
    pub gender: String,
    pub age: String,
    pub occasion: String,
    pub budget: u32,
    pub interests: BTreeSet<String>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            relation: String::new(),
            gender: String::new(),
            age: DEFAULT_AGE.into(),
            occasion: String::new(),
            budget: BUDGET_DEFAULT,
            interests: BTreeSet::new(),
        }
    }
}

/// Single-select option groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Relation,
    Gender,
    Age,
    Occasion,
}

impl WizardState {
    pub fn select(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Relation => self.relation = value,
            Field::Gender => self.gender = value,
            Field::Age => self.age = value,
            Field::Occasion => self.occasion = value,
        }
    }

    pub fn toggle_interest(&mut self, value: &str) {
        if !self.interests.remove(value) {
            self.interests.insert(value.to_string());
        }
    }

    /// Slider drags and preset chips both land here.
    pub fn set_budget(&mut self, value: u32) {
        self.budget = value.clamp(BUDGET_MIN, BUDGET_MAX);
    }

    pub fn budget_label(&self) -> String {
        budget_label(self.budget)
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.relation.trim().is_empty() {
            missing.push("relation");
        }
        if self.gender.trim().is_empty() {
            missing.push("gender");
        }
        if self.occasion.trim().is_empty() {
            missing.push("occasion");
        }
        missing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Basics = 1,
    Details = 2,
    Loading = 3,
    Results = 4,
}

impl Step {
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Step::Basics),
            2 => Some(Step::Details),
            3 => Some(Step::Loading),
            4 => Some(Step::Results),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub step: Step,
    pub outcome: Result<(), ValidationError>,
}

/// Where the wizard ends up when asked to move from `current` to `target`.
/// Entering `Details` requires relation, gender and occasion; on failure the
/// visible step does not change.
pub fn transition(state: &WizardState, current: Step, target: Step) -> Transition {
    if target == Step::Details {
        let missing = state.missing_fields();
        if !missing.is_empty() {
            return Transition {
                step: current,
                outcome: Err(ValidationError::MissingFields(missing)),
            };
        }
    }
    Transition { step: target, outcome: Ok(()) }
}

pub fn budget_label(value: u32) -> String {
    if value >= BUDGET_MAX {
        format!("{}원+", format_won(BUDGET_MAX))
    } else {
        format!("{}원", format_won(value))
    }
}

/// Thousands grouping as shown in ko-KR (`50000` -> `50,000`).
pub fn format_won(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
