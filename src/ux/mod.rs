use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::links::shopping_links;
use crate::wire::Recommendation;
use crate::wizard::{
    budget_label, Field, WizardState, AGES, BUDGET_PRESETS, GENDERS, INTERESTS, OCCASIONS, RELATIONS,
};

const LOADING_MESSAGES: &[&str] = &[
    "취향을 분석하고 있어요...",
    "요즘 뜨는 선물을 찾아보는 중...",
    "센스 있는 브랜드를 고르는 중...",
    "카드에 적을 문구를 다듬는 중...",
];

/// One trimmed line of input, or `None` once the input is closed or unreadable.
pub fn prompt_line<R: BufRead>(input: &mut R, prompt: &str) -> Option<String> {
    print!("{} ", prompt.bold());
    let _ = io::stdout().flush();
    let mut s = String::new();
    match input.read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim().to_string()),
    }
}

pub fn alert(msg: &str) {
    println!("\n{} {}\n", "!".red().bold(), msg.red());
}

fn header(step: u8, title: &str) {
    println!("\n{}", format!("━━━━━━━━━━━━ STEP {step} ━━━━━━━━━━━━").bold());
    println!("{}\n", title.bold());
}

fn print_options(options: &[&str], is_selected: impl Fn(&str) -> bool) {
    for (i, opt) in options.iter().enumerate() {
        let line = format!("  {:>2}. {}", i + 1, opt);
        if is_selected(*opt) {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line);
        }
    }
}

/// A 1-based option number, or `None` for blank/out-of-range input.
pub fn parse_choice(input: &str, len: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=len).contains(&n).then(|| n - 1)
}

fn pick_one<R: BufRead>(
    input: &mut R,
    state: &mut WizardState,
    field: Field,
    title: &str,
    options: &[&str],
) -> Option<()> {
    let current = match field {
        Field::Relation => state.relation.clone(),
        Field::Gender => state.gender.clone(),
        Field::Age => state.age.clone(),
        Field::Occasion => state.occasion.clone(),
    };
    println!("{}", title.cyan().bold());
    print_options(options, |o| o == current);
    let line = prompt_line(input, "번호 선택 (Enter: 유지) >")?;
    if let Some(i) = parse_choice(&line, options.len()) {
        state.select(field, options[i]);
    }
    println!();
    Some(())
}

/// `None` when input ends mid-screen.
pub fn screen_basics<R: BufRead>(input: &mut R, state: &mut WizardState) -> Option<()> {
    header(1, "누구에게 선물하나요?");
    pick_one(input, state, Field::Relation, "관계", RELATIONS)?;
    pick_one(input, state, Field::Gender, "성별", GENDERS)?;
    pick_one(input, state, Field::Age, "나이", AGES)?;
    pick_one(input, state, Field::Occasion, "상황", OCCASIONS)
}

/// Chip number (1..=presets) or a raw amount such as `120000` / `120,000`.
pub fn parse_budget_input(input: &str) -> Option<u32> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim_end_matches('원');
    let n: u32 = cleaned.parse().ok()?;
    if (1..=BUDGET_PRESETS.len() as u32).contains(&n) {
        return Some(BUDGET_PRESETS[n as usize - 1]);
    }
    Some(n)
}

pub fn screen_details<R: BufRead>(input: &mut R, state: &mut WizardState) -> Option<()> {
    header(2, "예산과 관심사를 알려주세요");

    println!("{} {}", "예산".cyan().bold(), state.budget_label().yellow().bold());
    for (i, v) in BUDGET_PRESETS.iter().enumerate() {
        print!("  [{}] {}", i + 1, budget_label(*v));
    }
    println!();
    let line = prompt_line(input, "칩 번호 또는 금액 입력 (Enter: 유지) >")?;
    if let Some(v) = parse_budget_input(&line) {
        state.set_budget(v);
        println!("  → {}", state.budget_label().yellow().bold());
    }
    println!();

    loop {
        println!("{}", "관심사 (여러 개 선택 가능)".cyan().bold());
        print_options(INTERESTS, |o| state.interests.contains(o));
        let line = prompt_line(input, "번호를 공백으로 구분해 토글 (Enter: 완료) >")?;
        if line.is_empty() {
            return Some(());
        }
        for tok in line.split_whitespace() {
            if let Some(i) = parse_choice(tok, INTERESTS.len()) {
                state.toggle_interest(INTERESTS[i]);
            }
        }
        println!();
    }
}

/// Cosmetic rotating message shown while a request is in flight.
pub struct Ticker {
    bar: ProgressBar,
    rotator: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.magenta} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(LOADING_MESSAGES[0]);
        bar.enable_steady_tick(Duration::from_millis(120));

        let handle = bar.clone();
        let rotator = tokio::spawn(async move {
            let mut idx = 0usize;
            let mut every = tokio::time::interval(Duration::from_millis(2_000));
            every.tick().await;
            loop {
                every.tick().await;
                idx = (idx + 1) % LOADING_MESSAGES.len();
                handle.set_message(LOADING_MESSAGES[idx]);
            }
        });

        Self { bar, rotator: Some(rotator) }
    }

    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        if let Some(r) = self.rotator.take() {
            r.abort();
            self.bar.finish_and_clear();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.halt();
    }
}

pub fn render_card(index: usize, item: &Recommendation) -> String {
    let links = shopping_links(&item.search_keyword);
    let mut out = String::new();
    out.push_str(&format!(
        "{}  {}  {}\n",
        format!("#{}", index + 1).magenta().bold(),
        format!("[{}]", item.brand).magenta(),
        item.approx_price.bold()
    ));
    out.push_str(&format!("    {}\n", item.product_name.bold()));
    out.push_str(&format!("    💡 {}\n", item.reason));
    out.push_str(&format!("    💌 \"{}\"\n", item.message.italic()));
    out.push_str(&format!("    {} {}\n", "N 네이버 최저가".green().bold(), links.naver));
    out.push_str(&format!("    {} {}", "C 쿠팡 로켓배송".red().bold(), links.coupang));
    out
}

pub fn show_results(items: &[Recommendation]) {
    println!("\n{}", "━━━━━━━━━━━━ 추천 결과 ━━━━━━━━━━━━".bold());
    if items.is_empty() {
        println!("(추천 결과가 없습니다)");
    }
    for (i, item) in items.iter().enumerate() {
        println!("{}\n", render_card(i, item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_parsing() {
        assert_eq!(parse_choice("1", 3), Some(0));
        assert_eq!(parse_choice(" 3 ", 3), Some(2));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("", 3), None);
        assert_eq!(parse_choice("x", 3), None);
    }

    #[test]
    fn budget_input_accepts_chips_and_amounts() {
        assert_eq!(parse_budget_input("1"), Some(30_000));
        assert_eq!(parse_budget_input("5"), Some(500_000));
        assert_eq!(parse_budget_input("120,000"), Some(120_000));
        assert_eq!(parse_budget_input("70000원"), Some(70_000));
        assert_eq!(parse_budget_input(""), None);
        assert_eq!(parse_budget_input("많이"), None);
    }

    #[test]
    fn closed_input_ends_every_screen() {
        let mut state = WizardState::default();
        assert_eq!(prompt_line(&mut io::empty(), ">"), None);
        assert_eq!(screen_basics(&mut io::Cursor::new("1\n2\n"), &mut state), None);
        assert_eq!(state.relation, RELATIONS[0]);
        assert_eq!(state.gender, GENDERS[1]);
        assert_eq!(screen_details(&mut io::Cursor::new("3\n1 2\n"), &mut state), None);
        assert_eq!(state.budget, 100_000);
        assert_eq!(state.interests.len(), 2);
    }

    #[test]
    fn blank_line_is_not_end_of_input() {
        let mut state = WizardState::default();
        assert_eq!(prompt_line(&mut io::Cursor::new("\n"), ">"), Some(String::new()));
        assert_eq!(screen_details(&mut io::Cursor::new("\n\n"), &mut state), Some(()));
        assert_eq!(state.budget, 50_000);
    }

    #[test]
    fn card_carries_text_and_links() {
        colored::control::set_override(false);
        let item = Recommendation {
            product_name: "우드세이지 앤 씨솔트 30ml".into(),
            brand: "조말론".into(),
            reason: "은은하고 고급스러운 향".into(),
            approx_price: "11만원대".into(),
            search_keyword: "조말론 우드세이지".into(),
            message: "늘 고마워".into(),
        };
        let card = render_card(0, &item);
        assert!(card.contains("#1  [조말론]  11만원대"));
        assert!(card.contains("우드세이지 앤 씨솔트 30ml"));
        assert!(card.contains("💌 \"늘 고마워\""));
        assert!(card.contains(&shopping_links("조말론 우드세이지").naver));
        assert!(card.contains(&shopping_links("조말론 우드세이지").coupang));
    }
}
