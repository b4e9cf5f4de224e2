use serde::Serialize;

use h2print_core::db::types::Classification;
use h2print_core::signature::Signature;
use h2print_core::trace::ClientSignature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid output format '{}'. Expected 'text' or 'json'.", s),
        }
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: String,
    client_id: u64,
    frame_count: usize,
    frame_types: Vec<&'a str>,
    sha1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical: Option<String>,
    signature: serde_json::Value,
    #[serde(skip_serializing_if = "Classification::is_empty")]
    classification: &'a Classification,
}

pub fn print_signature(
    client: &ClientSignature,
    classification: &Classification,
    format: OutputFormat,
    verbose: bool,
) {
    match format {
        OutputFormat::Text => print_text(client, classification, verbose),
        OutputFormat::Json => print_json(client, classification, verbose),
    }
}

fn print_text(client: &ClientSignature, classification: &Classification, verbose: bool) {
    let frame_types: Vec<&str> = client
        .signature
        .frames()
        .iter()
        .map(|f| f.frame_type())
        .collect();

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Client:     id={}", client.client_id);
    println!(
        "  Frames:     {} ({})",
        frame_types.len(),
        frame_types.join(", ")
    );
    println!("  ──────────────────────────────────────────────────");
    println!("  SHA-1:      {}", client.signature.hash_hex());
    if verbose {
        println!("  Canonical:  {}", client.signature.canonicalize());
    }
    if let Some(best) = &classification.best_match {
        println!("  ──────────────────────────────────────────────────");
        println!("  Match:      {}", best);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn print_json(client: &ClientSignature, classification: &Classification, verbose: bool) {
    let record = JsonRecord {
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        client_id: client.client_id,
        frame_count: client.signature.frames().len(),
        frame_types: client
            .signature
            .frames()
            .iter()
            .map(|f| f.frame_type())
            .collect(),
        sha1: client.signature.hash_hex(),
        canonical: if verbose {
            Some(client.signature.canonicalize())
        } else {
            None
        },
        signature: client.signature.to_value(),
        classification,
    };

    println!("{}", serde_json::to_string(&record).unwrap());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_formats() {
        assert_eq!(OutputFormat::parse("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::parse("yaml").is_err());
    }
}
