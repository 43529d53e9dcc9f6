//! Prompt catalog and key planning.
//!
//! Templates carry `${domContent}`, `${pageUrl}` and `${userAction}`
//! placeholders. Planning crosses the requested output modes with the chosen
//! language/engine pair; unsupported combinations become user-visible
//! warnings rather than failures.

/// Keys into the prompt catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKey {
    SeleniumJavaPageOnly,
    PlaywrightTypeScriptPageOnly,
    CucumberOnly,
    CucumberWithSeleniumJavaSteps,
    TestDataRandom,
}

impl PromptKey {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SeleniumJavaPageOnly => "SELENIUM_JAVA_PAGE_ONLY",
            Self::PlaywrightTypeScriptPageOnly => "PLAYWRIGHT_TYPESCRIPT_PAGE_ONLY",
            Self::CucumberOnly => "CUCUMBER_ONLY",
            Self::CucumberWithSeleniumJavaSteps => "CUCUMBER_WITH_SELENIUM_JAVA_STEPS",
            Self::TestDataRandom => "TEST_DATA_RANDOM",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            Self::SeleniumJavaPageOnly => SELENIUM_JAVA_PAGE_ONLY,
            Self::PlaywrightTypeScriptPageOnly => PLAYWRIGHT_TYPESCRIPT_PAGE_ONLY,
            Self::CucumberOnly => CUCUMBER_ONLY,
            Self::CucumberWithSeleniumJavaSteps => CUCUMBER_WITH_SELENIUM_JAVA_STEPS,
            Self::TestDataRandom => TEST_DATA_RANDOM,
        }
    }
}

/// Values substituted into a template.
#[derive(Debug, Clone, Default)]
pub struct PromptVars {
    pub dom_content: String,
    pub page_url: String,
    pub user_action: String,
}

/// Substitute the placeholder variables into a template.
pub fn render(key: PromptKey, vars: &PromptVars) -> String {
    key.template()
        .replace("${domContent}", &vars.dom_content)
        .replace("${pageUrl}", &vars.page_url)
        .replace("${userAction}", &vars.user_action)
}

/// Requested output modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputModes {
    pub feature: bool,
    pub page: bool,
}

impl From<&testloom_config::OutputSettings> for OutputModes {
    fn from(output: &testloom_config::OutputSettings) -> Self {
        Self {
            feature: output.feature,
            page: output.page,
        }
    }
}

/// The ordered prompt keys for one request, plus any warnings to surface.
#[derive(Debug, Clone, Default)]
pub struct PromptPlan {
    pub keys: Vec<PromptKey>,
    pub warnings: Vec<String>,
}

/// Cross the output modes with the language/engine pair.
pub fn plan_prompt_keys(modes: OutputModes, language: &str, engine: &str) -> PromptPlan {
    let lang = language.to_lowercase();
    let eng = engine.to_lowercase();
    let java_selenium = lang == "java" && eng == "selenium";
    let ts_playwright = lang == "ts" && eng == "playwright";

    let mut plan = PromptPlan::default();

    if !modes.feature && !modes.page {
        // No mode selected: fall back to page object generation only where
        // the default is unambiguous.
        if java_selenium {
            plan.keys.push(PromptKey::SeleniumJavaPageOnly);
        }
        return plan;
    }

    if modes.feature && modes.page {
        if java_selenium {
            // Feature and page object come back as one combined artifact.
            plan.keys.push(PromptKey::CucumberWithSeleniumJavaSteps);
        } else if ts_playwright {
            plan.keys.push(PromptKey::CucumberOnly);
            plan.keys.push(PromptKey::PlaywrightTypeScriptPageOnly);
        } else {
            // The page object cannot be generated for this pair; the feature
            // file alone still can.
            plan.keys.push(PromptKey::CucumberOnly);
            plan.warnings.push(unsupported(&lang, &eng));
        }
    } else if modes.feature {
        plan.keys.push(PromptKey::CucumberOnly);
    } else if java_selenium {
        plan.keys.push(PromptKey::SeleniumJavaPageOnly);
    } else if ts_playwright {
        plan.keys.push(PromptKey::PlaywrightTypeScriptPageOnly);
    } else {
        plan.warnings.push(unsupported(&lang, &eng));
    }

    plan
}

fn unsupported(language: &str, engine: &str) -> String {
    format!(
        "{language}/{engine} combination is not yet supported. Only Java/Selenium is currently available."
    )
}

const SELENIUM_JAVA_PAGE_ONLY: &str = r#"
Instructions:
- Generate ONLY a Selenium Java Page Object Class (no test code).
- Add JavaDoc for methods & class.
- Use Selenium 2.30+ compatible imports.
- Use meaningful method names.
- Do NOT include explanations or test code.

Context:
DOM:
```html
${domContent}
```

Example:
```java
package com.testloom.pages;

/**
 * Page Object for Component Page
 */
public class ComponentPage {
    // Add methods as per the DOM
}
```

Persona:
- Audience: Automation engineer focusing on maintainable POM structure.

Output Format:
- A single Java class inside a ```java``` block.

Tone:
- Clean, maintainable, enterprise-ready.
"#;

const PLAYWRIGHT_TYPESCRIPT_PAGE_ONLY: &str = r#"
Instructions:
- Generate ONLY a Playwright TypeScript Page Object Class (no test code).
- Add TSDoc for methods & class.
- Use Playwright v1.0+ compatible imports (e.g., import { Page } from '@playwright/test').
- Use meaningful method names.
- Do NOT include explanations or test code.

Context:
DOM:
```html
${domContent}
```

Example:
```typescript
export class ComponentPage {
  /**
   * Page Object for Component Page
   */
  constructor(page: Page) {}
  // Add methods as per the DOM
}
```

Persona:
- Audience: Automation engineer focusing on maintainable POM structure in Playwright.

Output Format:
- A single TypeScript class inside a ```typescript``` block.

Tone:
- Clean, maintainable, enterprise-ready.
"#;

const CUCUMBER_ONLY: &str = r#"
Instructions:
- Generate ONLY a Cucumber (.feature) file.
- Use Scenario Outline with Examples table.
- Make sure every step is relevant to the provided DOM.
- Do not combine multiple actions into one step.
- Use realistic data in the Examples table.
- Use dropdown values only from provided DOM.
- Generate multiple scenarios if applicable.

Context:
DOM:
```html
${domContent}
```

Persona:
- Audience: BDD testers who only need feature files.

Output Format:
- A single .feature file inside a ```gherkin``` block.

Tone:
- Precise, readable, review-friendly.
"#;

const CUCUMBER_WITH_SELENIUM_JAVA_STEPS: &str = r#"
Instructions:
- Generate a Cucumber (.feature) file AND its Selenium Java step definitions.
- Use Scenario Outline with Examples table; every step must map to a method.
- Steps must be relevant to the provided DOM; use dropdown values only from it.
- Navigate to the page URL in the background step.
- Do NOT include explanations.

Context:
DOM:
```html
${domContent}
```
URL: ${pageUrl}

Persona:
- Audience: Automation engineer wiring BDD scenarios to Selenium.

Output Format:
- A ```gherkin``` block followed by a ```java``` block with the step class.

Tone:
- Clean, maintainable, enterprise-ready.
"#;

const TEST_DATA_RANDOM: &str = r#"
Instructions:
- Generate realistic random test data rows for the form fields in the DOM.
- Derive one column per input field; use the field's label or name as header.
- Respect value constraints visible in the DOM (maxlength, options, types).
- Return CSV only. No explanations, no markdown outside the CSV.

Context:
DOM:
```html
${domContent}
```

Output Format:
- A CSV document with a header row.
"#;

#[cfg(test)]
#[path = "prompts_tests.rs"]
mod tests;
