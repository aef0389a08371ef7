//! Sample Borrower Generator
//!
//! Sends synthetic borrower assessment requests to the risk service over
//! NATS and logs the tier of each reply.

use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Request payload matching the service's borrower format
#[derive(Debug, Clone, Serialize)]
struct Borrower {
    person_age: i64,
    person_income: f64,
    person_emp_exp: i64,
    person_home_ownership: String,
    loan_amnt: f64,
    loan_int_rate: f64,
    loan_intent: String,
    credit_score: i64,
    cb_person_cred_hist_length: i64,
    previous_loan_defaults_on_file: String,
}

/// Borrower generator for smoke testing
struct BorrowerGenerator {
    rng: rand::rngs::ThreadRng,
}

impl BorrowerGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Established borrower with a small loan relative to income
    fn generate_reliable(&mut self) -> Borrower {
        let age = self.rng.gen_range(30..65);
        let income = self.rng.gen_range(60_000.0..200_000.0);

        Borrower {
            person_age: age,
            person_income: income,
            person_emp_exp: self.rng.gen_range(5..(age - 20).min(50)),
            person_home_ownership: self.random_choice(&["OWN", "MORTGAGE", "mortgage"]).to_string(),
            loan_amnt: income * self.rng.gen_range(0.02..0.15),
            loan_int_rate: self.rng.gen_range(5.0..11.0),
            loan_intent: self
                .random_choice(&["EDUCATION", "HOMEIMPROVEMENT", "VENTURE", "personal"])
                .to_string(),
            credit_score: self.rng.gen_range(700..850),
            cb_person_cred_hist_length: self.rng.gen_range(8..25),
            previous_loan_defaults_on_file: "No".to_string(),
        }
    }

    /// Young borrower, large loan relative to income, prior default
    fn generate_risky(&mut self) -> Borrower {
        let income = self.rng.gen_range(12_000.0..40_000.0);

        Borrower {
            person_age: self.rng.gen_range(20..28),
            person_income: income,
            person_emp_exp: self.rng.gen_range(0..3),
            person_home_ownership: self.random_choice(&["RENT", "rent", "OTHER"]).to_string(),
            loan_amnt: income * self.rng.gen_range(0.35..0.8),
            loan_int_rate: self.rng.gen_range(15.0..24.0),
            loan_intent: self
                .random_choice(&["DEBTCONSOLIDATION", "MEDICAL", "PERSONAL"])
                .to_string(),
            credit_score: self.rng.gen_range(450..600),
            cb_person_cred_hist_length: self.rng.gen_range(1..4),
            previous_loan_defaults_on_file: self.random_choice(&["Yes", "yes", "No"]).to_string(),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Share of risky borrowers, clamped to [0, 1] since `gen_bool` panics
/// outside it.
fn parse_rate(arg: Option<&str>, default: f64) -> f64 {
    arg.and_then(|s| s.parse::<f64>().ok())
        .filter(|r| r.is_finite())
        .unwrap_or(default)
        .clamp(0.0, 1.0)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_borrowers=info".parse()?),
        )
        .init();

    info!("Starting sample borrower generator");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("creditpath.assess");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(20);
    let risky_rate = parse_rate(args.get(4).map(|s| s.as_str()), 0.3);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        risky_rate = risky_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, risky_rate).await;
        }
    };

    let mut generator = BorrowerGenerator::new();
    let mut rng = rand::thread_rng();
    let mut tiers: std::collections::BTreeMap<String, u64> = std::collections::BTreeMap::new();

    for i in 0..count {
        let borrower = if rng.gen_bool(risky_rate) {
            generator.generate_risky()
        } else {
            generator.generate_reliable()
        };

        let payload = serde_json::to_vec(&borrower)?;
        let reply = client.request(subject.to_string(), payload.into()).await?;
        let response: serde_json::Value = serde_json::from_slice(&reply.payload)?;

        let tier = response["assessment"]["risk_level"]
            .as_str()
            .unwrap_or("error")
            .to_string();
        info!(
            request = i + 1,
            probability = %response["assessment"]["default_probability"],
            risk_level = %tier,
            "Assessment received"
        );
        *tiers.entry(tier).or_insert(0) += 1;

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(count = count, tiers = ?tiers, "Completed");

    Ok(())
}

async fn run_dry_mode(count: u64, risky_rate: f64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = BorrowerGenerator::new();
    let mut rng = rand::thread_rng();

    let batch: Vec<Borrower> = (0..count)
        .map(|_| {
            if rng.gen_bool(risky_rate) {
                generator.generate_risky()
            } else {
                generator.generate_reliable()
            }
        })
        .collect();

    info!("Sample batch request:\n{}", serde_json::to_string_pretty(&batch)?);

    Ok(())
}
