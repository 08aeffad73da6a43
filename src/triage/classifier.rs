use crate::models::{Finding, FlowRecord, Framework, VulnerabilityScenario};

/// Ordered keyword rule; the first rule with any matching keyword wins.
struct Rule<T: 'static> {
    keywords: &'static [&'static str],
    label: T,
}

static FRAMEWORK_RULES: &[Rule<Framework>] = &[
    Rule { keywords: &["django"], label: Framework::Django },
    Rule { keywords: &["flask"], label: Framework::Flask },
    Rule { keywords: &["fastapi"], label: Framework::FastApi },
    Rule { keywords: &["tornado"], label: Framework::Tornado },
    Rule { keywords: &["pyramid"], label: Framework::Pyramid },
    Rule { keywords: &["spring"], label: Framework::Spring },
    Rule { keywords: &["struts"], label: Framework::Struts },
    Rule { keywords: &["rails"], label: Framework::Rails },
    Rule { keywords: &["beego"], label: Framework::Beego },
    Rule { keywords: &["gorilla"], label: Framework::Gorilla },
];

static SCENARIO_RULES: &[Rule<VulnerabilityScenario>] = &[
    Rule {
        keywords: &["send_mail", "sendmail", "email", "mail", "smtp"],
        label: VulnerabilityScenario::PasswordReset,
    },
    Rule { keywords: &["redirect"], label: VulnerabilityScenario::OpenRedirect },
    Rule {
        keywords: &["render_template", "template"],
        label: VulnerabilityScenario::TemplateInjection,
    },
    Rule {
        keywords: &["url_for", "reverse", "build_absolute_uri"],
        label: VulnerabilityScenario::UrlGeneration,
    },
    Rule {
        keywords: &["attribute", "setattr", "getattr"],
        label: VulnerabilityScenario::AttributeManipulation,
    },
    Rule { keywords: &["form"], label: VulnerabilityScenario::FormDataManipulation },
    Rule { keywords: &["request"], label: VulnerabilityScenario::RequestParameterPollution },
    Rule { keywords: &["dict"], label: VulnerabilityScenario::DataStructurePollution },
    Rule { keywords: &["async", "await"], label: VulnerabilityScenario::AsyncContextPollution },
];

fn first_match<T: Copy>(rules: &[Rule<T>], haystacks: &[&str]) -> Option<T> {
    rules
        .iter()
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|kw| haystacks.iter().any(|h| h.contains(kw)))
        })
        .map(|rule| rule.label)
}

/// Attribute a flow to a scenario (sink only) and a framework (source or sink).
pub fn classify(record: &FlowRecord) -> (VulnerabilityScenario, Framework) {
    let source = record.source.to_lowercase();
    let sink = record.sink.to_lowercase();

    let scenario = first_match(SCENARIO_RULES, &[sink.as_str()]).unwrap_or(VulnerabilityScenario::Unknown);
    let framework = first_match(FRAMEWORK_RULES, &[source.as_str(), sink.as_str()]).unwrap_or(Framework::Unknown);
    (scenario, framework)
}

pub fn to_finding(id: usize, record: FlowRecord) -> Finding {
    let (scenario, framework) = classify(&record);
    Finding {
        id,
        description: format!("HNP: {} in {}", scenario, framework),
        source: record.source,
        sink: record.sink,
        vulnerability_scenario: scenario,
        framework,
        target: record.target,
    }
}
