use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use sensorlogic::{
    apply_transform, construct_payload, filter, path, Comparator, ContextFilter, DataFilter, Event, EventContext,
    EventDependencyFilter, ExprFilter, JsonType, LogicalOperator, PayloadField, TimeFilter, TransformSpec,
    TriggerParameter, TriggerParameterSource,
};

const DATA: &str = r#"{
    "ref": "refs/heads/main",
    "repository": {"name": "sensorlogic", "owner": {"login": "ada"}},
    "commits": [
        {"id": "c1", "author": "ada", "added": ["a.rs"]},
        {"id": "c2", "author": "bot", "added": []},
        {"id": "c3", "author": "grace", "added": ["b.rs", "c.rs"]}
    ],
    "size": 3
}"#;

fn sample_event() -> Event {
    let ctx = EventContext::new("github", "push")
        .with_subject("sensorlogic")
        .with_time(Utc.with_ymd_and_hms(2024, 5, 6, 10, 30, 0).unwrap());
    Event::new(ctx, DATA)
}

fn full_filter() -> EventDependencyFilter {
    EventDependencyFilter {
        time: Some(TimeFilter {
            start: "08:00:00".to_string(),
            stop: "18:00:00".to_string(),
            timezone: Some("Europe/London".to_string()),
        }),
        context: Some(ContextFilter {
            event_type: "push".to_string(),
            ..ContextFilter::default()
        }),
        data: vec![
            DataFilter {
                path: "ref".to_string(),
                json_type: JsonType::String,
                value: vec!["^refs/heads/(main|release-.*)$".to_string()],
                comparator: Comparator::EqualTo,
                template: None,
            },
            DataFilter {
                path: "size".to_string(),
                json_type: JsonType::Number,
                value: vec!["0".to_string()],
                comparator: Comparator::GreaterThan,
                template: None,
            },
        ],
        exprs: vec![ExprFilter {
            expr: "owner == \"ada\" && n >= 2".to_string(),
            fields: vec![
                PayloadField {
                    path: "repository.owner.login".to_string(),
                    name: "owner".to_string(),
                },
                PayloadField {
                    path: "commits.#".to_string(),
                    name: "n".to_string(),
                },
            ],
        }],
        ..EventDependencyFilter::default()
    }
}

fn bench_filter(c: &mut Criterion) {
    let event = sample_event();
    let spec = full_filter();

    let mut group = c.benchmark_group("filter");
    group.throughput(Throughput::Elements(1));
    group.bench_function("all_categories_and", |b| {
        b.iter(|| filter(black_box(&event), Some(&spec), LogicalOperator::And));
    });
    group.bench_function("all_categories_or", |b| {
        b.iter(|| filter(black_box(&event), Some(&spec), LogicalOperator::Or));
    });

    let script = EventDependencyFilter {
        script: "return event.size > 2 and event.repository.owner.login == \"ada\"".to_string(),
        ..EventDependencyFilter::default()
    };
    group.bench_function("lua_script", |b| {
        b.iter(|| filter(black_box(&event), Some(&script), LogicalOperator::And));
    });
    group.finish();
}

fn bench_path(c: &mut Criterion) {
    let doc: serde_json::Value = serde_json::from_str(DATA).unwrap();
    let mut group = c.benchmark_group("path");
    group.bench_function("dotted", |b| b.iter(|| path::get(black_box(&doc), "repository.owner.login")));
    group.bench_function("query_all", |b| {
        b.iter(|| path::get(black_box(&doc), r#"commits.#(author!="bot")#.id"#));
    });
    group.bench_function("multipath", |b| {
        b.iter(|| path::get(black_box(&doc), "[ref,repository.name,commits.#.id]"));
    });
    group.finish();
}

fn bench_transform_and_params(c: &mut Criterion) {
    let event = sample_event();
    let jq = TransformSpec::jq("{ref: .ref, authors: [.commits[].author]}");

    let events = HashMap::from([("push".to_string(), event.clone())]);
    let params = vec![
        TriggerParameter::new(TriggerParameterSource::data_key("push", "repository.name"), "repo"),
        TriggerParameter::new(
            TriggerParameterSource::data_key("push", "commits.#.id").with_raw_data(),
            "commits",
        ),
        TriggerParameter::new(TriggerParameterSource::context_key("push", "subject"), "meta.subject"),
    ];

    let mut group = c.benchmark_group("trigger");
    group.bench_function("jq_transform", |b| b.iter(|| apply_transform(black_box(&event), Some(&jq))));
    group.bench_function("construct_payload", |b| {
        b.iter(|| construct_payload(black_box(&events), &params));
    });
    group.finish();
}

criterion_group!(benches, bench_filter, bench_path, bench_transform_and_params);
criterion_main!(benches);
