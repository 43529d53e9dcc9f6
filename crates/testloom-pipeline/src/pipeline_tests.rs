use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;

use super::*;
use testloom_protocols::error::GenerateError;
use testloom_protocols::types::{ElementSnapshot, Generation};

mock! {
    pub Generator {}

    #[async_trait]
    impl TextGenerator for Generator {
        fn id(&self) -> &str;
        async fn generate(&self, prompt: &str, model: &str) -> Result<Generation, GenerateError>;
    }
}

fn selection() -> SelectionSnapshot {
    let mut s = SelectionSnapshot::new();
    s.toggle(ElementSnapshot::new("<input name=\"user\">"));
    s
}

fn job(feature: bool, page: bool, language: &str, engine: &str) -> CodeGenJob {
    CodeGenJob {
        selection: selection(),
        page_url: "https://example.test/login".to_string(),
        instruction: "use explicit waits".to_string(),
        modes: OutputModes { feature, page },
        language: language.to_string(),
        engine: engine.to_string(),
        model: "gpt-4o".to_string(),
    }
}

#[tokio::test]
async fn test_single_key_job() {
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .withf(|prompt, model| {
            prompt.contains("<input name=\"user\">")
                && prompt.contains("Additional Instructions: use explicit waits")
                && model == "gpt-4o"
        })
        .times(1)
        .returning(|_, _| {
            Ok(Generation::new(
                "  ```java\nclass LoginPage {}\n```  ",
                testloom_protocols::types::TokenUsage::new(100, 40),
            ))
        });

    let pipeline = GenerationPipeline::new(Arc::new(generator));
    let output = pipeline
        .generate_code(&job(false, true, "java", "selenium"))
        .await
        .unwrap();

    assert_eq!(output.text, "```java\nclass LoginPage {}\n```");
    assert_eq!(output.usage.input_tokens, 100);
    assert_eq!(output.usage.output_tokens, 40);
    assert!(output.warnings.is_empty());
}

#[tokio::test]
async fn test_two_keys_join_with_blank_line_and_sum_usage() {
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .withf(|prompt, _| prompt.contains("Cucumber"))
        .times(1)
        .returning(|_, _| {
            Ok(Generation::new(
                "```gherkin\nFeature: Login\n```",
                testloom_protocols::types::TokenUsage::new(50, 20),
            ))
        });
    generator
        .expect_generate()
        .withf(|prompt, _| prompt.contains("Playwright"))
        .times(1)
        .returning(|_, _| {
            Ok(Generation::new(
                "```typescript\nexport class LoginPage {}\n```",
                testloom_protocols::types::TokenUsage::new(60, 30),
            ))
        });

    let pipeline = GenerationPipeline::new(Arc::new(generator));
    let output = pipeline
        .generate_code(&job(true, true, "ts", "playwright"))
        .await
        .unwrap();

    assert_eq!(
        output.text,
        "```gherkin\nFeature: Login\n```\n\n```typescript\nexport class LoginPage {}\n```"
    );
    assert_eq!(output.usage.input_tokens, 110);
    assert_eq!(output.usage.output_tokens, 50);
}

#[tokio::test]
async fn test_second_call_failure_discards_partial_output() {
    let mut generator = MockGenerator::new();
    generator
        .expect_generate()
        .withf(|prompt, _| prompt.contains("Cucumber"))
        .times(1)
        .returning(|_, _| {
            Ok(Generation::new(
                "partial feature text",
                testloom_protocols::types::TokenUsage::new(50, 20),
            ))
        });
    generator
        .expect_generate()
        .withf(|prompt, _| prompt.contains("Playwright"))
        .times(1)
        .returning(|_, _| {
            Err(GenerateError::Upstream {
                status: 500,
                body: "boom".to_string(),
            })
        });

    let pipeline = GenerationPipeline::new(Arc::new(generator));
    let err = pipeline
        .generate_code(&job(true, true, "ts", "playwright"))
        .await
        .unwrap_err();

    match err {
        PipelineError::Generate(GenerateError::Upstream { status, .. }) => {
            assert_eq!(status, 500);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unsupported_pair_produces_no_calls() {
    let mut generator = MockGenerator::new();
    generator.expect_generate().times(0);

    let pipeline = GenerationPipeline::new(Arc::new(generator));
    let output = pipeline
        .generate_code(&job(false, true, "python", "playwright"))
        .await
        .unwrap();

    assert!(output.text.is_empty());
    assert_eq!(output.usage, testloom_protocols::types::TokenUsage::default());
    assert_eq!(output.warnings.len(), 1);
}

#[test]
fn test_from_settings_applies_row_cap() {
    let mut settings = testloom_config::Settings::default();
    settings.limits.test_data_max_rows = 50;
    let pipeline =
        GenerationPipeline::from_settings(Arc::new(MockGenerator::new()), &settings);
    assert_eq!(pipeline.max_rows, 50);
}

struct BlockingGenerator {
    release: tokio::sync::Notify,
}

#[async_trait]
impl TextGenerator for BlockingGenerator {
    fn id(&self) -> &str {
        "blocking"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _model: &str,
    ) -> Result<Generation, GenerateError> {
        self.release.notified().await;
        Ok(Generation::new("done", Default::default()))
    }
}

#[tokio::test]
async fn test_at_most_one_job_in_flight() {
    let generator = Arc::new(BlockingGenerator {
        release: tokio::sync::Notify::new(),
    });
    let pipeline = Arc::new(GenerationPipeline::new(generator.clone()));

    let first = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline
                .generate_code(&job(false, true, "java", "selenium"))
                .await
        })
    };
    // Let the first job claim the slot.
    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let err = pipeline
        .generate_code(&job(false, true, "java", "selenium"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Busy));

    generator.release.notify_one();
    let output = first.await.unwrap().unwrap();
    assert_eq!(output.text, "done");

    // The slot frees up once the job completes.
    generator.release.notify_one();
    assert!(
        pipeline
            .generate_code(&job(false, true, "java", "selenium"))
            .await
            .is_ok()
    );
}
