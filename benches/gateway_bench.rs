use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Version};
use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gateway_access_log::{
    format::RenderSettings, tokens::TokenRegistry, Exchange, Preset, RequestSnapshot, Template,
    Timing,
};

fn sample_request() -> RequestSnapshot {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_static("Basic YXJ3b3JrYWNjOg=="),
    );
    headers.insert(header::USER_AGENT, HeaderValue::from_static("criterion"));

    RequestSnapshot {
        method: Method::GET,
        uri: "/api/v1/users?page=2".parse().unwrap(),
        version: Version::HTTP_11,
        headers,
        client_ip: None,
        peer_addr: Some("127.0.0.1:40000".parse().unwrap()),
    }
}

fn preset_render_benchmark(c: &mut Criterion) {
    let request = sample_request();
    let response_headers = HeaderMap::new();
    let exchange = Exchange {
        request: &request,
        status: StatusCode::OK,
        response_headers: &response_headers,
        response_length: Some(512),
        timing: Timing::from_millis(12),
        now: Utc::now(),
    };
    let settings = RenderSettings {
        colored: true,
        absent_text: "undefined",
    };

    for preset in Preset::ALL {
        let template = Template::from(preset);
        c.bench_function(&format!("render_{}", preset), |b| {
            b.iter(|| {
                black_box(
                    template
                        .render(TokenRegistry::global(), &exchange, &settings)
                        .unwrap(),
                )
            })
        });
    }
}

fn template_resolve_benchmark(c: &mut Criterion) {
    c.bench_function("template_resolve_literal", |b| {
        b.iter(|| black_box(Template::resolve(":method :url :status :req[x-request-id]")))
    });
}

criterion_group!(benches, preset_render_benchmark, template_resolve_benchmark);
criterion_main!(benches);
