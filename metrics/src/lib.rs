use std::{
    env,
    sync::{
        LazyLock,
        atomic::{AtomicBool, Ordering},
    },
};

use strum_macros::EnumIter;

static CONNECTION_URI: LazyLock<String> = LazyLock::new(|| {
    let host = env::var("PROMETHEUS_HOST").unwrap_or("localhost".into());
    let port = env::var("PROMETHEUS_PORT").unwrap_or("9090".into());

    format!("http://{host}:{port}/api/v1/otlp/v1/metrics")
});

const SERVICE_NAME: &str = "image-encoder";

static ENABLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, EnumIter, Hash, Eq, PartialEq)]
pub enum Metrics {
    /// Counter for encode requests answered from the disk cache
    CacheHit,
    /// Counter for encode requests that had to go to the remote
    CacheMiss,
    /// Counter for encode requests that failed anywhere in the pipeline
    EncodeFailure,
    /// Counter for identify/convert subprocess runs
    ToolInvocation,
}

impl Metrics {
    fn to_string(&self) -> String {
        match self {
            Metrics::CacheHit => "CACHE_HIT".to_string(),
            Metrics::CacheMiss => "CACHE_MISS".to_string(),
            Metrics::EncodeFailure => "ENCODE_FAILURE".to_string(),
            Metrics::ToolInvocation => "TOOL_INVOCATION".to_string(),
        }
    }
}

/// Turns on exporting. Until this is called `put_metric!` records nothing
/// and no exporter is built.
pub fn enable() {
    ENABLED.store(true, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub mod _private {
    pub use opentelemetry::KeyValue;

    use std::{collections::HashMap, sync::LazyLock, time::Duration};

    use opentelemetry::{
        global,
        metrics::{Counter, Meter},
    };
    use opentelemetry_otlp::{MetricExporter, Protocol, WithExportConfig};
    use opentelemetry_sdk::{
        Resource,
        metrics::{PeriodicReader, SdkMeterProvider},
    };
    use strum::IntoEnumIterator;

    use crate::{CONNECTION_URI, Metrics, SERVICE_NAME};

    static OTEL_METER: LazyLock<Meter> = LazyLock::new(|| {
        global::set_meter_provider(PROVIDER.clone());
        global::meter(SERVICE_NAME)
    });

    pub static PROVIDER: LazyLock<SdkMeterProvider> = LazyLock::new(|| {
        let exporter = MetricExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(CONNECTION_URI.to_string())
            .build()
            .expect("Expect Prometheus exporter to build");

        let reader = PeriodicReader::builder(exporter)
            .with_interval(Duration::from_secs(5))
            .build();

        let resource = Resource::builder().with_service_name(SERVICE_NAME).build();

        SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource)
            .build()
    });

    pub static COUNTERS: LazyLock<HashMap<Metrics, Counter<u64>>> = LazyLock::new(|| {
        let mut mapping: HashMap<Metrics, Counter<u64>> = HashMap::new();

        for metric in crate::Metrics::iter() {
            let metric_meter = OTEL_METER.u64_counter(metric.to_string()).build();

            mapping.insert(metric, metric_meter);
        }

        mapping
    });
}

#[macro_export]
macro_rules! put_metric {
    ($metric_name:expr, $added_value:expr $(, $key:literal => $value:expr)* $(,)?) => {{
        if $crate::is_enabled() {
            use $crate::_private::{KeyValue, COUNTERS};

            let metric_name: $crate::Metrics = $metric_name;
            let added_value: u64 = $added_value;

            let attributes: &[KeyValue] = &[
                $(KeyValue::new($key, $value),)*
            ];

            if let Some(counter) = COUNTERS.get(&metric_name) {
                counter.add(added_value, attributes);
            }
        }
    }};
}
