//! An OpenAI-compatible chat-completions client that doubles as the
//! resolution engine's [`AddressParser`] and [`LlmArbitrator`] collaborator.
//!
//! Both roles share one HTTP client and the same `OPENAI_*` environment
//! variables, since they are the same kind of call (one prompt in, one JSON
//! object out) against the same endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use gazetteer_core::error::CoreResult;
use gazetteer_core::judge::{CandidatePair, LlmArbitrator, LlmVerdict};
use gazetteer_core::model::{AddressRecord, Decision, ParsedAddress};
use gazetteer_core::parser::AddressParser;

use crate::error::{ParserError, ParserResult};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4.1-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fields an LLM parse response may populate besides `norm_text`/`intersection`.
const ASSIGNABLE_FIELDS: &[&str] = &[
    "province", "city", "district", "street", "road", "road_no", "aoi", "building",
    "unit", "floor", "room", "shop_name", "direction", "distance_m",
];

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// The OpenAI-compatible client. Constructed once and shared (behind an
/// `Arc`) across the pipeline's lifetime; no connection pooling beyond what
/// `reqwest::Client` already does internally.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    /// Build a client from `OPENAI_BASE_URL`/`OPENAI_MODEL`/`OPENAI_API_KEY`.
    /// The HTTP client is built directly with an explicit 30s timeout and no
    /// retry layer, deliberately not reusing a retrying-by-default builder.
    pub fn from_env() -> Self {
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        OpenAiClient { http, base_url, model, api_key }
    }

    fn require_key(&self) -> ParserResult<&str> {
        self.api_key.as_deref().ok_or(ParserError::MissingApiKey)
    }

    async fn chat(&self, system: String, user: String, api_key: &str) -> ParserResult<Value> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: 0.0,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ParserError::MalformedResponse("empty choices array".to_string()))?
            .message
            .content;

        serde_json::from_str(&content)
            .map_err(|e| ParserError::MalformedResponse(format!("response content was not JSON: {e}")))
    }

    fn build_parsed(raw: &str, obj: &Value) -> ParsedAddress {
        let mut parsed = ParsedAddress::unparsed(raw);
        let Some(map) = obj.as_object() else { return parsed };

        for field in ASSIGNABLE_FIELDS {
            let Some(value) = map.get(*field) else { continue };
            if value.is_null() {
                continue;
            }
            let text = match value {
                Value::String(s) if s.is_empty() => continue,
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            assign_field(&mut parsed, field, text);
        }

        if let Some(pair) = map.get("intersection").and_then(|v| v.as_array()) {
            if pair.len() == 2 {
                if let (Some(a), Some(b)) = (pair[0].as_str(), pair[1].as_str()) {
                    parsed.intersection = Some((a.to_string(), b.to_string()));
                }
            }
        }

        parsed
    }
}

fn assign_field(parsed: &mut ParsedAddress, field: &str, value: String) {
    match field {
        "province" => parsed.province = Some(value),
        "city" => parsed.city = Some(value),
        "district" => parsed.district = Some(value),
        "street" => parsed.street = Some(value),
        "road" => parsed.road = Some(value),
        "road_no" => parsed.road_no = Some(value),
        "aoi" => parsed.aoi = Some(value),
        "building" => parsed.building = Some(value),
        "unit" => parsed.unit = Some(value),
        "floor" => parsed.floor = Some(value),
        "room" => parsed.room = Some(value),
        "shop_name" => parsed.shop_name = Some(value),
        "direction" => parsed.direction = Some(value),
        "distance_m" => parsed.distance_m = value.parse().ok(),
        _ => {}
    }
}

#[async_trait]
impl AddressParser for OpenAiClient {
    async fn parse(&self, raw: &str) -> CoreResult<ParsedAddress> {
        let api_key = match self.require_key() {
            Ok(k) => k,
            Err(e) => {
                warn!(error = %e, "remote parser unavailable, marking record unparsed");
                return Ok(ParsedAddress::unparsed(raw));
            }
        };

        let system = "你是地址结构化解析器。必须返回合法 JSON 字符串，不得包含注释或多余文字。\n\
            字段：province, city, district, road, road_no, aoi, building, floor, room, shop_name, \
            intersection(长度恰好为 2 的数组), direction, distance_m。\n若字段缺失请置为 null。"
            .to_string();
        let user = format!("请把以下地址解析为 JSON：\nraw=\"{raw}\"");

        match self.chat(system, user, api_key).await {
            Ok(obj) => Ok(Self::build_parsed(raw, &obj)),
            Err(err) => {
                warn!(error = %err, %raw, "address parse failed, falling back to unparsed");
                Ok(ParsedAddress::unparsed(raw))
            }
        }
    }

    async fn parse_batch(&self, raws: &[String]) -> CoreResult<Vec<ParsedAddress>> {
        if raws.is_empty() {
            return Ok(Vec::new());
        }
        let api_key = match self.require_key() {
            Ok(k) => k,
            Err(e) => {
                warn!(error = %e, "remote parser unavailable, marking batch unparsed");
                return Ok(raws.iter().map(|r| ParsedAddress::unparsed(r)).collect());
            }
        };

        let addr_lines: String = raws
            .iter()
            .enumerate()
            .map(|(i, text)| format!("{}. {text}\n", i + 1))
            .collect();
        let system = "你是地址结构化解析器。请按输入顺序解析多个地址，并返回 JSON 数组，数组长度与输入一致。\n\
            每个元素须包含：province, city, district, road, road_no, aoi, building, floor, room, shop_name, \
            intersection(数组且长度为 2), direction, distance_m。\n若字段缺失请填 null。只输出 JSON 数组，不要其他文字。"
            .to_string();
        let user = format!("地址列表：\n{addr_lines}");

        match self.chat(system, user, api_key).await {
            Ok(Value::Array(items)) if items.len() == raws.len() => Ok(raws
                .iter()
                .zip(items.iter())
                .map(|(raw, obj)| Self::build_parsed(raw, obj))
                .collect()),
            Ok(_) => {
                warn!("batch parse response was not a same-length JSON array, falling back to unparsed");
                Ok(raws.iter().map(|r| ParsedAddress::unparsed(r)).collect())
            }
            Err(err) => {
                warn!(error = %err, "batch address parse failed, falling back to unparsed");
                Ok(raws.iter().map(|r| ParsedAddress::unparsed(r)).collect())
            }
        }
    }
}

#[async_trait]
impl LlmArbitrator for OpenAiClient {
    async fn arbitrate(
        &self,
        query: (&AddressRecord, &ParsedAddress),
        candidates: &[CandidatePair<'_>],
    ) -> CoreResult<LlmVerdict> {
        let api_key = self.require_key().map_err(Into::<gazetteer_core::error::CoreError>::into)?;

        let (qrec, qparsed) = query;
        let payload = json!({
            "query": {"record": qrec, "parsed": qparsed},
            "candidates": candidates.iter().map(|c| json!({
                "record": c.rec,
                "parsed": c.parsed,
                "pre_score": c.pre_score.score,
            })).collect::<Vec<_>>(),
        });

        let system = "你是地址匹配裁判。根据输入的结构化字段判断两条地址是否描述同一实体。\
            仅返回 JSON，例如 {\"decision\": \"SAME\", \"best_idx\": 0, \"reason\": \"...\", \"score\": 0.9}。"
            .to_string();
        let user = payload.to_string();

        debug!(candidate_count = candidates.len(), "invoking LLM judge");

        let obj = self.chat(system, user, api_key).await.map_err(Into::<gazetteer_core::error::CoreError>::into)?;

        let decision_str = obj.get("decision").and_then(|v| v.as_str()).unwrap_or("DIFFERENT");
        let decision = if decision_str.eq_ignore_ascii_case("SAME") {
            Decision::Same
        } else {
            Decision::Different
        };

        let mut best_idx = obj.get("best_idx").and_then(|v| v.as_i64()).unwrap_or(0);
        if best_idx < 0 || best_idx as usize >= candidates.len() {
            best_idx = 0;
        }
        let best_idx = if candidates.is_empty() { None } else { Some(best_idx as usize) };

        let score = obj
            .get("score")
            .and_then(|v| v.as_f64())
            .or_else(|| best_idx.and_then(|i| candidates.get(i)).map(|c| c.pre_score.score))
            .unwrap_or(0.0);
        let reason = obj.get("reason").and_then(|v| v.as_str()).unwrap_or("").to_string();

        Ok(LlmVerdict { decision, best_idx, score, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_parsed_assigns_known_fields_and_skips_blanks() {
        let obj = json!({
            "province": "安徽省",
            "road": "",
            "floor": 2,
            "intersection": ["科学大道", "天波路"],
        });
        let parsed = OpenAiClient::build_parsed("raw", &obj);
        assert_eq!(parsed.province.as_deref(), Some("安徽省"));
        assert!(parsed.road.is_none());
        assert_eq!(parsed.floor.as_deref(), Some("2"));
        assert_eq!(parsed.intersection, Some(("科学大道".to_string(), "天波路".to_string())));
    }

    #[test]
    fn build_parsed_ignores_malformed_intersection() {
        let obj = json!({"intersection": ["only_one"]});
        let parsed = OpenAiClient::build_parsed("raw", &obj);
        assert!(parsed.intersection.is_none());
    }

    #[tokio::test]
    async fn parse_without_api_key_falls_back_to_unparsed() {
        std::env::remove_var("OPENAI_API_KEY");
        let client = OpenAiClient::from_env();
        let parsed = client.parse("蜀山区创新大道100号").await.unwrap();
        assert_eq!(parsed.norm_text, "蜀山区创新大道100号");
        assert!(parsed.district.is_none());
    }
}
