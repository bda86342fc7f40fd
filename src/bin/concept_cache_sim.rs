//! concept-cache-sim — 以合成生成器重放请求负载并打印缓存统计
//!
//! Replays a synthetic request workload against a `ConceptService` backed by a
//! canned generator, then prints cache statistics.
//!
//! Usage:
//!   concept-cache-sim [--config <path>] [--requests <n>] [--briefs <n>]
//!
//! Without `--config`, settings come from `CONCEPT_CACHE_*` environment
//! variables. Set `RUST_LOG=debug` to see individual hits and misses.

use async_trait::async_trait;
use concept_cache::cache::{CacheConfig, ConceptDraft, GenerationCache};
use concept_cache::generation::{
    ConceptGenerator, ConceptService, GenerationRequest, GenerationSource,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const TONES: [&str; 3] = ["bold", "strategic", "conversational"];
const DEVICES: [&str; 4] = ["metaphor", "alliteration", "hyperbole", "antithesis"];
const WORDS: [&str; 12] = [
    "clean", "seas", "steps", "midnight", "harvest", "rituals", "bright", "tide", "quiet",
    "thunder", "golden", "hour",
];

/// Builds headlines from a rotating word list so repeats show up now and then.
struct SyntheticGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl ConceptGenerator for SyntheticGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
        _avoid_headlines: &[String],
    ) -> concept_cache::Result<Vec<ConceptDraft>> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        Ok((0..request.concept_count)
            .map(|i| {
                let seed = call * 7 + i * 3;
                let headline = format!(
                    "{} {} {}",
                    WORDS[seed % WORDS.len()],
                    WORDS[(seed + 1) % WORDS.len()],
                    WORDS[(seed + 5) % WORDS.len()]
                );
                let device = request
                    .devices
                    .get(i % request.devices.len().max(1))
                    .cloned()
                    .unwrap_or_default();
                ConceptDraft::new(&request.brief, &request.tone, headline)
                    .with_rhetorical_device(device)
                    .with_content(format!("Body copy for {}", request.brief))
                    .with_usage(350, 0.0021)
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

struct Options {
    config: Option<String>,
    requests: usize,
    briefs: usize,
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let mut options = Options {
        config: None,
        requests: 200,
        briefs: 25,
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("missing value for {arg}"))
        };
        match arg.as_str() {
            "--config" => options.config = Some(value()?),
            "--requests" => options.requests = value()?.parse()?,
            "--briefs" => options.briefs = value()?.parse::<usize>()?.max(1),
            "help" | "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(options)
}

fn print_usage() {
    println!(
        r#"concept-cache-sim — replay a synthetic workload against the generation cache

USAGE:
    concept-cache-sim [--config <path>] [--requests <n>] [--briefs <n>]

ENVIRONMENT:
    CONCEPT_CACHE_MAX_SIZE                  Entry bound (default 1000)
    CONCEPT_CACHE_TTL_MINUTES               Entry lifetime (default 120)
    CONCEPT_CACHE_CLEANUP_INTERVAL_MINUTES  Sweep interval (default 30)
    RUST_LOG                                Log filter, e.g. debug"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_args(&args)?;
    let config = match options.config.as_deref() {
        Some(path) => CacheConfig::from_yaml_file(path)?,
        None => CacheConfig::from_env()?,
    };

    let cache = GenerationCache::start(config)?;
    let service = ConceptService::new(
        cache.clone(),
        Arc::new(SyntheticGenerator {
            calls: AtomicUsize::new(0),
        }),
    );

    let (mut hits, mut misses, mut failures, mut rejected) = (0usize, 0usize, 0usize, 0usize);
    for n in 0..options.requests {
        // Skewed toward low brief numbers so some briefs get hot.
        let brief_no = (n * n + 3 * n) % options.briefs;
        let brief = format!("Campaign brief #{brief_no}: launch a premium product");
        let tone = TONES[n % TONES.len()];
        let devices = [DEVICES[n % DEVICES.len()], DEVICES[(n / 2) % DEVICES.len()]];
        let request = GenerationRequest::new(&brief, tone, 3, &devices);

        match service.generate(&request).await {
            Ok(outcome) => {
                rejected += outcome.rejected_duplicates;
                match outcome.source {
                    GenerationSource::Cache => hits += 1,
                    GenerationSource::Generated => misses += 1,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "request failed");
                failures += 1;
            }
        }
    }

    println!(
        "requests: {}  hits: {}  misses: {}  failures: {}  rejected headlines: {}",
        options.requests, hits, misses, failures, rejected
    );
    println!("{}", cache.stats().format());

    cache.shutdown();
    Ok(())
}
