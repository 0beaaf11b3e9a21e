use chrono::{Duration, TimeZone, Utc};
use granary::query::RawParams;
use granary::{ActivityRecord, Corpus, PlannerLimits, RecordStore, SearchEngine, SearchResponse};
use granary_http::handlers::AppState;
use granary_http::ServerConfig;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const LP0776938_PURL: &str = "http://purl.org/au-research/grants/arc/LP0776938";
pub const AUT_PURL: &str = "http://AUT.org/au-research/grants/arc/LP100100422AUTx.Grant";

/// Number of generated records with "fish" in the title.
pub const FISH_RECORDS: usize = 120;

fn base(id: &str) -> Value {
    json!({
        "id": id,
        "identifiers": [format!("urn:granary:{}", id)],
        "type": "grant",
        "status": "active",
        "titles": ["Untitled"],
        "institutions": ["University of Sydney"],
        "funder": "Australian Research Council",
        "fundingScheme": "Discovery Projects",
        "researchers": ["Sam Carter"],
        "dateTimeCreated": "2015-01-01T00:00:00Z",
        "dateTimeModified": "2015-01-01T00:00:00Z"
    })
}

fn record(id: &str, overrides: Value) -> ActivityRecord {
    let mut value = base(id);
    if let (Some(target), Value::Object(fields)) = (value.as_object_mut(), overrides) {
        for (k, v) in fields {
            target.insert(k, v);
        }
    }
    serde_json::from_value(value).unwrap()
}

fn fish_record(n: usize) -> ActivityRecord {
    let created =
        Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap() + Duration::days(20 * n as i64);
    let modified = created + Duration::days((n % 7) as i64 * 30);
    let status = if n % 2 == 0 { "active" } else { "closed" };
    let (funder, scheme) = if n % 3 == 0 {
        ("National Health and Medical Research Council", "NHMRC Project Grants")
    } else {
        ("Australian Research Council", "Discovery Projects")
    };
    record(
        &format!("fish-{:03}", n),
        json!({
            "titles": [format!("Freshwater fish population study {}", n)],
            "description": format!("Survey {} of native fish in inland rivers", n),
            "subjects": ["Ecology", "Fisheries Sciences"],
            "status": status,
            "funder": funder,
            "fundingScheme": scheme,
            "dateTimeCreated": created.to_rfc3339(),
            "dateTimeModified": modified.to_rfc3339()
        }),
    )
}

/// Hand-written records covering each filter, plus [`FISH_RECORDS`]
/// generated ones.
pub fn fixture_records() -> Vec<ActivityRecord> {
    let mut records = vec![
        record(
            "arc-LP0776938",
            json!({
                "purl": LP0776938_PURL,
                "identifiers": [LP0776938_PURL, "LP0776938"],
                "titles": ["Caves climate and speleothem records"],
                "description": "A unique archive of past climate preserved in cave formations",
                "subjects": ["Earth Sciences", "Geochemistry"],
                "institutions": ["University of Melbourne"],
                "fundingScheme": "Linkage Projects",
                "principalInvestigator": "Jacob George",
                "researchers": ["Jacob George", "Ann Lee"],
                "dateTimeCreated": "2016-03-01T09:30:00+10:00",
                "dateTimeModified": "2016-06-01T00:00:00Z"
            }),
        ),
        record(
            "arc-LP100100422",
            json!({
                "identifiers": [AUT_PURL, "LP100100422", "chorizo risotto"],
                "titles": ["Chorizo risotto as a model of emulsion stability"],
                "description": "Cooking chorizo risotto at industrial scale",
                "subjects": ["Food Sciences"],
                "institutions": ["Auckland University of Technology"],
                "fundingScheme": "Linkage Projects",
                "researchers": ["Mia Rossi"],
                "dateTimeCreated": "2010-05-05T00:00:00Z",
                "dateTimeModified": "2017-01-10T12:00:00Z"
            }),
        ),
        record(
            "nhmrc-1000001",
            json!({
                "purl": "http://purl.org/au-research/grants/nhmrc/1000001",
                "identifiers": ["http://purl.org/au-research/grants/nhmrc/1000001"],
                "status": "closed",
                "titles": ["Cancer clustering in regional communities"],
                "description": "Spatial statistics of cancer incidence",
                "subjects": ["Public Health and Health Services"],
                "institutions": ["Monash University"],
                "funder": "National Health and Medical Research Council",
                "fundingScheme": "NHMRC Project Grants",
                "principalInvestigator": "Jacob George",
                "researchers": ["Jacob George", "Priya Nair"],
                "dateTimeCreated": "2013-02-02T00:00:00Z",
                "dateTimeModified": "2014-02-02T00:00:00Z"
            }),
        ),
        record(
            "arc-DP0987654",
            json!({
                "titles": ["Negotiation protocols for intelligent agents"],
                "description": "Unique biology",
                "subjects": ["Intelligent Agents", "Artificial Intelligence"],
                "institutions": ["University of New South Wales"],
                "researchers": ["Lee Wong"],
                "dateTimeCreated": "2015-11-28T13:15:30Z",
                "dateTimeModified": "2015-11-28T13:15:30Z"
            }),
        ),
        record(
            "arc-FT0001",
            json!({
                "type": "Grant",
                "titles": ["Capitalised type record"],
                "funder": "Australian Research Council Linkage Office",
                "dateTimeCreated": "2015-11-28T13:15:29Z",
                "dateTimeModified": "2015-11-28T13:15:29Z"
            }),
        ),
        record(
            "ands-collection-1",
            json!({
                "type": "collection",
                "titles": ["Unique biology of cave fauna"],
                "description": "unique biology of cave fauna, with photographs",
                "subjects": ["Zoology"],
                "funder": null,
                "fundingScheme": null,
                "dateTimeCreated": "2018-07-07T07:07:07-03:00",
                "dateTimeModified": "2019-01-01T00:00:00Z"
            }),
        ),
    ];
    records.extend((0..FISH_RECORDS).map(fish_record));
    records
}

#[allow(dead_code)]
pub fn fixture_corpus() -> Corpus {
    Corpus::from_records(fixture_records()).unwrap()
}

#[allow(dead_code)]
pub fn fixture_engine() -> SearchEngine {
    let store = Arc::new(RecordStore::new(fixture_corpus()));
    SearchEngine::new(store, PlannerLimits::default())
}

/// Run a query string (`q=fish&rows=5`) against the engine.
#[allow(dead_code)]
pub fn search(engine: &SearchEngine, query: &str) -> SearchResponse {
    engine
        .search(&RawParams::from_query_string(query))
        .unwrap_or_else(|e| panic!("search {:?} failed: {}", query, e))
}

#[allow(dead_code)]
pub fn ids(response: &SearchResponse) -> Vec<String> {
    response
        .data
        .records
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

/// Write the fixture corpus as JSON lines and serve it on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_server() -> (String, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let corpus_path = temp_dir.path().join("activities.jsonl");
    let mut file = std::fs::File::create(&corpus_path).unwrap();
    for r in fixture_records() {
        writeln!(file, "{}", serde_json::to_string(&r).unwrap()).unwrap();
    }

    let config = ServerConfig {
        corpus_path: Some(corpus_path),
        ..ServerConfig::default()
    };
    let addr = spawn_with_config(config).await;
    (addr, temp_dir)
}

/// Serve whatever `config` opens (honouring `lenient_startup`).
#[allow(dead_code)]
pub async fn spawn_with_config(config: ServerConfig) -> String {
    let store = Arc::new(granary_http::server::open_store(&config).unwrap());
    let state = Arc::new(AppState {
        engine: SearchEngine::new(store, config.planner_limits()),
        query_timeout: config.query_timeout,
    });
    let app = granary_http::build_router(state, config.search_path());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    addr
}

/// Engine whose page cap exceeds the fixture size, for whole-result set
/// comparisons.
#[allow(dead_code)]
pub fn wide_engine() -> SearchEngine {
    let store = Arc::new(RecordStore::new(fixture_corpus()));
    SearchEngine::new(
        store,
        PlannerLimits {
            default_rows: 10,
            max_rows: 1000,
        },
    )
}
