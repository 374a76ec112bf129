//! The `AddressParser` trait: the seam between the resolution engine and
//! whatever turns raw address text into structured fields. `gazetteer-parser`
//! provides the concrete OpenAI-compatible implementation.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::model::ParsedAddress;

/// Structures free-text addresses into [`ParsedAddress`] records, singly or
/// in batch.
///
/// A parse failure for one address should not fail the whole batch: callers
/// are expected to fall back to [`ParsedAddress::unparsed`] for any address
/// the parser could not structure, and record that as a conflict-free but
/// featureless record rather than aborting the run.
#[async_trait]
pub trait AddressParser: Send + Sync {
    /// Parse a single raw address.
    async fn parse(&self, raw: &str) -> CoreResult<ParsedAddress>;

    /// Parse a batch of raw addresses in one call. The default
    /// implementation parses sequentially; a batch-capable backend should
    /// override this to issue one request for the whole batch.
    async fn parse_batch(&self, raws: &[String]) -> CoreResult<Vec<ParsedAddress>> {
        let mut out = Vec::with_capacity(raws.len());
        for raw in raws {
            out.push(self.parse(raw).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoParser;

    #[async_trait]
    impl AddressParser for EchoParser {
        async fn parse(&self, raw: &str) -> CoreResult<ParsedAddress> {
            Ok(ParsedAddress::unparsed(raw))
        }
    }

    #[tokio::test]
    async fn default_parse_batch_parses_each_item() {
        let parser = EchoParser;
        let raws = vec!["a".to_string(), "b".to_string()];
        let out = parser.parse_batch(&raws).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].norm_text, "a");
        assert_eq!(out[1].norm_text, "b");
    }
}
