//! Example: Retrieve the full text of a few live pages
//!
//! Run with: cargo run -p fulltext --example get_full_text

use fulltext::{ErrorKind, Outcome, RetrievalService};

/// Test case definition
struct TestCase {
    url: &'static str,
    description: &'static str,
    expect_error: Option<ErrorKind>,
    expect_contains: Option<&'static str>,
}

const TEST_CASES: &[TestCase] = &[
    TestCase {
        url: "https://example.com",
        description: "Simple HTML page",
        expect_error: None,
        expect_contains: Some("illustrative examples"),
    },
    TestCase {
        url: "https://httpbin.org/html",
        description: "Long-form HTML",
        expect_error: None,
        expect_contains: Some("Herman Melville"),
    },
    TestCase {
        url: "https://httpbin.org/image/png",
        description: "Binary content",
        expect_error: Some(ErrorKind::UnsupportedContentType),
        expect_contains: None,
    },
    TestCase {
        url: "https://httpbin.org/status/404",
        description: "Missing page",
        expect_error: Some(ErrorKind::NotFound),
        expect_contains: None,
    },
    TestCase {
        url: "https://httpbin.org/redirect/7",
        description: "Redirect chain beyond the limit",
        expect_error: Some(ErrorKind::TooManyRedirects),
        expect_contains: None,
    },
];

#[tokio::main]
async fn main() {
    println!("FullText URL Examples");
    println!("=====================\n");

    let service = match RetrievalService::builder().build() {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut passed = 0;
    let mut failed = 0;

    for (i, case) in TEST_CASES.iter().enumerate() {
        println!("{}. {}", i + 1, case.description);
        println!("   URL: {}", case.url);

        let outcome = service.get_full_text(case.url).await;
        print_outcome_summary(&outcome);

        if check_expectations(case, &outcome) {
            println!("   ✓ PASS\n");
            passed += 1;
        } else {
            println!("   ✗ FAIL (expectations not met)\n");
            failed += 1;
        }
    }

    println!("=====================");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}

fn print_outcome_summary(outcome: &Outcome) {
    println!("   Status: {}", outcome.http_status());

    match outcome {
        Outcome::Success(result) => {
            if let Some(ref title) = result.title {
                println!("   Title: {}", title);
            }
            println!("   Blocks: {}", result.blocks.len());
            println!("   Confidence: {:.2}", result.confidence);
            if let Some(first) = result.blocks.first() {
                let preview = first.chars().take(100).collect::<String>();
                println!(
                    "   Preview: {}{}",
                    preview,
                    if first.chars().count() > 100 { "..." } else { "" }
                );
            }
        }
        Outcome::Failure(failure) => {
            println!("   Error: {} ({})", failure.kind, failure.detail);
        }
    }
}

fn check_expectations(case: &TestCase, outcome: &Outcome) -> bool {
    if outcome.error_kind() != case.expect_error {
        println!(
            "   Expected error {:?}, got {:?}",
            case.expect_error,
            outcome.error_kind()
        );
        return false;
    }

    if let (Some(expected_text), Outcome::Success(result)) = (case.expect_contains, outcome) {
        if !result.blocks.iter().any(|b| b.contains(expected_text)) {
            println!("   Expected content to contain '{}'", expected_text);
            return false;
        }
    }

    true
}
