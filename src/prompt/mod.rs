use crate::wire::{Content, GenerateRequest, GenerationConfig, Part, Tool};
use crate::wizard::{format_won, WizardState};

const NO_INTERESTS: &str = "없음 (대중적인 것 추천)";

fn persona() -> &'static str {
r#"당신은 대한민국 최고의 선물 추천 전문가(MD)입니다.
다음 사용자 정보를 바탕으로 현재 한국 시장에서 구매 가능한 최고의 선물 3가지를 추천해주세요."#
}

fn requirements() -> &'static str {
r#"[필수 조건]
1. 두루뭉술한 카테고리가 아닌, 정확한 브랜드와 제품명(예: 조말론 우드세이지 앤 씨솔트 30ml)을 제시할 것.
2. 최신 트렌드를 반영할 것.
3. 추천 이유는 '센스 있다'는 소리를 들을 수 있는 감성적인 포인트로 작성할 것.
4. 아래 JSON 스키마를 정확히 따를 것."#
}

fn response_schema() -> &'static str {
r#"Response JSON Schema:
{
  "recommendations": [
    {
      "product_name": "정확한 제품명",
      "brand": "브랜드명",
      "reason": "감성적인 추천 이유",
      "approx_price": "예상 가격 (문자열)",
      "search_keyword": "쇼핑 검색 최적화 키워드",
      "message": "카드에 적을 감동적인 짧은 문구"
    }
  ]
}"#
}

/// Prompt text for one recommendation attempt. Depends on nothing but `state`.
pub fn build_prompt(state: &WizardState) -> String {
    let interests = if state.interests.is_empty() {
        NO_INTERESTS.to_string()
    } else {
        state.interests.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    };

    format!(
        "{persona}\n\n[사용자 정보]\n- 대상: {relation} ({gender}, {age})\n- 상황: {occasion}\n- 예산: 약 {budget}원\n- 관심사: {interests}\n\n{requirements}\n\n{schema}\n",
        persona = persona(),
        relation = state.relation,
        gender = state.gender,
        age = state.age,
        occasion = state.occasion,
        budget = format_won(state.budget),
        interests = interests,
        requirements = requirements(),
        schema = response_schema(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Ask Gemini for `application/json` output.
    pub expect_json: bool,
    /// Attach the google_search grounding tool.
    pub grounding: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { expect_json: true, grounding: true }
    }
}

pub fn build_request(state: &WizardState, opts: &GenerationOptions) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            role: None,
            parts: vec![Part { text: build_prompt(state) }],
        }],
        generation_config: opts.expect_json.then(|| GenerationConfig {
            response_mime_type: Some("application/json".into()),
        }),
        tools: if opts.grounding { vec![Tool::default()] } else { Vec::new() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::Field;

    fn state() -> WizardState {
        let mut s = WizardState::default();
        s.select(Field::Relation, "부모님");
        s.select(Field::Gender, "여성");
        s.select(Field::Age, "50대");
        s.select(Field::Occasion, "생일");
        s.set_budget(150_000);
        s
    }

    #[test]
    fn prompt_embeds_every_field() {
        let mut s = state();
        s.toggle_interest("요리");
        s.toggle_interest("여행");
        let p = build_prompt(&s);
        assert!(p.contains("- 대상: 부모님 (여성, 50대)"));
        assert!(p.contains("- 상황: 생일"));
        assert!(p.contains("- 예산: 약 150,000원"));
        assert!(p.contains("- 관심사: 여행, 요리") || p.contains("- 관심사: 요리, 여행"));
        assert!(p.contains("\"search_keyword\""));
        assert!(p.contains("[필수 조건]"));
    }

    #[test]
    fn empty_interests_fall_back_to_popular() {
        let p = build_prompt(&state());
        assert!(p.contains("- 관심사: 없음 (대중적인 것 추천)"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let mut a = state();
        a.toggle_interest("게임");
        a.toggle_interest("음악");
        let mut b = state();
        b.toggle_interest("음악");
        b.toggle_interest("게임");
        assert_eq!(build_prompt(&a), build_prompt(&b));
    }

    #[test]
    fn request_options_toggle_config_and_tools() {
        let s = state();
        let full = build_request(&s, &GenerationOptions::default());
        assert_eq!(full.tools.len(), 1);
        assert_eq!(
            full.generation_config.and_then(|c| c.response_mime_type).as_deref(),
            Some("application/json")
        );
        assert_eq!(full.contents[0].parts[0].text, build_prompt(&s));

        let bare = build_request(&s, &GenerationOptions { expect_json: false, grounding: false });
        assert!(bare.tools.is_empty());
        assert!(bare.generation_config.is_none());
    }
}
