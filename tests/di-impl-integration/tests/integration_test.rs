//! 解析引擎端到端集成测试

use autowire_common::{AutowireStrategy, ConfigError, ResolveError, Sdid};
use autowire_composition::Bootstrapper;
use config_abstractions::{ConfigKey, ConfigSource};
use config_impl::{load_sources, Document, LoadOptions};
use di_abstractions::{ComponentResolver, StructDescriptor};
use di_impl::{Container, RegistryBuilder};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

/// 测试组件
#[derive(Debug, Default)]
struct Redis {
    address: String,
    db: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RedisParam {
    address: String,
    #[serde(default)]
    db: i64,
}

#[derive(Debug, Default)]
struct Repository {
    redis: Option<Arc<Redis>>,
    cache: Option<Arc<Redis>>,
    table: String,
}

#[derive(Debug, Default)]
struct Handler {
    repository: Option<Arc<Repository>>,
    tags: Vec<String>,
    limits: Limits,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
struct Limits {
    rate: f64,
    burst: u32,
    retry: Retry,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
struct Retry {
    attempts: u8,
    backoff_ms: u64,
}

const CONFIG: &str = r#"
app:
  table: users
  tags: [beta, alpha, gamma]
  limits:
    rate: 2
    burst: 10
    retry:
      attempts: 3
      backoff_ms: 250
autowire:
  singleton:
    redis:
      param:
        address: localhost:6379
        db: 0
      db1-redis:
        param:
          address: localhost:6379
          db: 1
      db2-redis:
        param:
          address: localhost:6379
          db: 2
"#;

fn redis_descriptor(counter: Arc<AtomicUsize>) -> StructDescriptor {
    StructDescriptor::builder_with_factory(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Redis::default()
    })
    .with_alias("redis")
    .with_param::<RedisParam>()
    .with_construct(|mut redis: Redis, param: RedisParam| {
        redis.address = param.address;
        redis.db = param.db;
        Ok::<_, std::convert::Infallible>(redis)
    })
    .build()
    .unwrap()
}

fn repository_descriptor() -> StructDescriptor {
    StructDescriptor::builder::<Repository>()
        .with_alias("repository")
        .inject_component_by_id(
            "redis",
            AutowireStrategy::singleton(),
            "redis",
            |r: &mut Repository, v: Arc<Redis>| r.redis = Some(v),
        )
        .inject_named_component(
            "cache",
            AutowireStrategy::singleton(),
            "redis",
            "db1-redis",
            |r: &mut Repository, v: Arc<Redis>| r.cache = Some(v),
        )
        .inject_config("table", "app.table", |r: &mut Repository, v: String| {
            r.table = v
        })
        .build()
        .unwrap()
}

fn handler_descriptor() -> StructDescriptor {
    StructDescriptor::builder::<Handler>()
        .with_alias("handler")
        .inject_component::<Repository, _>(
            "repository",
            AutowireStrategy::normal(),
            |h: &mut Handler, v| h.repository = Some(v),
        )
        .inject_required_config("tags", "app.tags", |h: &mut Handler, v: Vec<String>| {
            h.tags = v
        })
        .inject_config("limits", "app.limits", |h: &mut Handler, v: Limits| {
            h.limits = v
        })
        .build()
        .unwrap()
}

struct Fixture {
    container: Container,
    redis_builds: Arc<AtomicUsize>,
}

fn fixture() -> Fixture {
    let redis_builds = Arc::new(AtomicUsize::new(0));
    let registry = RegistryBuilder::new()
        .with(&AutowireStrategy::singleton(), redis_descriptor(redis_builds.clone()))
        .unwrap()
        .with(&AutowireStrategy::normal(), repository_descriptor())
        .unwrap()
        .with(&AutowireStrategy::normal(), handler_descriptor())
        .unwrap();

    let container = Bootstrapper::new()
        .with_load_options(
            LoadOptions::new()
                .without_main_file()
                .with_source(ConfigSource::yaml(CONFIG)),
        )
        .with_registry(registry)
        .bootstrap()
        .unwrap();

    Fixture {
        container,
        redis_builds,
    }
}

#[test]
fn test_key_round_trip_and_escapes() {
    for key in ["a", "a.b.c", "autowire.normal.redis.db1-redis.param"] {
        assert_eq!(ConfigKey::parse(key).unwrap().encode(), key);
    }

    let key = ConfigKey::parse("autowire.normal.<github.com/x/y.Redis>.param").unwrap();
    let names: Vec<_> = key.names().collect();
    assert_eq!(names, vec!["autowire", "normal", "github.com/x/y.Redis", "param"]);

    for bad in ["a.<b.c", "a.b>.c", "<a"] {
        assert!(matches!(
            ConfigKey::parse(bad),
            Err(ConfigError::MalformedKey { .. })
        ));
    }
}

#[test]
fn test_later_source_wins() -> anyhow::Result<()> {
    let document = load_sources(&[
        ConfigSource::yaml("a:\n  b: x\n"),
        ConfigSource::yaml("a:\n  b: y\n"),
    ])?;
    assert_eq!(document.bind_path::<String>("a.b")?, "y");
    Ok(())
}

#[test]
fn test_sibling_prefixes_resolve_independently() -> anyhow::Result<()> {
    let fixture = fixture();
    let container = &fixture.container;

    let default = container.get::<Redis>("singleton", "redis")?;
    let db1 = container.get_named::<Redis>("singleton", "redis", "db1-redis")?;
    let db2 = container.get_named::<Redis>("singleton", "redis", "db2-redis")?;

    assert_eq!((default.db, db1.db, db2.db), (0, 1, 2));
    assert_eq!(db2.address, "localhost:6379");
    assert!(!Arc::ptr_eq(&db1, &db2));
    assert_eq!(container.cached_singletons(), 3);
    assert_eq!(fixture.redis_builds.load(Ordering::SeqCst), 3);

    // 同一文档按前缀直接绑定也互不影响
    let document = container.document();
    let db1: RedisParam =
        document.bind_path("autowire.singleton.redis.db1-redis.param")?;
    let default: RedisParam = document.bind_path("autowire.singleton.redis.param")?;
    assert_eq!((default.db, db1.db), (0, 1));
    Ok(())
}

#[test]
fn test_singleton_is_built_once_sequentially() -> anyhow::Result<()> {
    let fixture = fixture();
    let first = fixture.container.resolve("singleton", "redis")?;
    let second = fixture.container.resolve("singleton", "redis")?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fixture.redis_builds.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_singleton_is_built_once_concurrently() -> anyhow::Result<()> {
    let fixture = Arc::new(fixture());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let fixture = Arc::clone(&fixture);
            tokio::task::spawn_blocking(move || fixture.container.get::<Redis>("singleton", "redis"))
        })
        .collect();

    let mut instances = Vec::new();
    for handle in handles {
        instances.push(handle.await??);
    }

    assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(fixture.redis_builds.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_normal_strategy_builds_fresh_graphs() -> anyhow::Result<()> {
    let fixture = fixture();
    let first = fixture.container.get::<Handler>("normal", "handler")?;
    let second = fixture.container.get::<Handler>("normal", "handler")?;

    assert!(!Arc::ptr_eq(&first, &second));
    let (Some(repo1), Some(repo2)) = (&first.repository, &second.repository) else {
        anyhow::bail!("repository was not injected");
    };
    assert!(!Arc::ptr_eq(repo1, repo2));
    assert_eq!(repo1.table, "users");

    // 单例依赖在两个图之间共享
    let (Some(redis1), Some(redis2)) = (&repo1.redis, &repo2.redis) else {
        anyhow::bail!("redis was not injected");
    };
    assert!(Arc::ptr_eq(redis1, redis2));
    assert_eq!(repo1.cache.as_ref().map(|r| r.db), Some(1));
    Ok(())
}

#[test]
fn test_unknown_identity_and_alias_are_not_found() {
    let fixture = fixture();
    let sdid = Sdid::of::<Redis>();

    assert!(fixture.container.resolve("singleton", sdid.as_str()).is_ok());
    for id in ["missing", "missing-alias"] {
        assert!(matches!(
            fixture.container.resolve("singleton", id),
            Err(ResolveError::NotFound { .. })
        ));
    }
    // 别名只在所属策略内有效
    assert!(fixture
        .container
        .resolve("normal", "redis")
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_sequence_order_and_nested_struct_binding() -> anyhow::Result<()> {
    let fixture = fixture();
    let handler = fixture.container.get::<Handler>("normal", "handler")?;

    assert_eq!(handler.tags, vec!["beta", "alpha", "gamma"]);
    assert_eq!(
        handler.limits,
        Limits {
            rate: 2.0,
            burst: 10,
            retry: Retry {
                attempts: 3,
                backoff_ms: 250,
            },
        }
    );
    Ok(())
}

#[derive(Debug, Default)]
struct Port {
    value: i64,
}

#[test]
fn test_mapping_into_scalar_is_type_mismatch() {
    let port = StructDescriptor::builder::<Port>()
        .with_alias("port")
        .inject_config("value", "server.port", |p: &mut Port, v: i64| p.value = v)
        .build()
        .unwrap();
    let registry = RegistryBuilder::new()
        .with(&AutowireStrategy::normal(), port)
        .unwrap()
        .freeze();
    let document = Document::from_value(serde_json::json!({"server": {"port": {"http": 80}}}));
    let container = Container::new(Arc::new(registry), Arc::new(document));

    match container.resolve("normal", "port") {
        Err(ResolveError::FieldInjection { failures, .. }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].field, "value");
            assert!(matches!(
                failures[0].error,
                ResolveError::Config {
                    source: ConfigError::TypeMismatch { .. }
                }
            ));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[derive(Debug, Default)]
struct NodeA {
    b: Option<Arc<NodeB>>,
}

#[derive(Debug, Default)]
struct NodeB {
    a: Option<Arc<NodeA>>,
}

fn cyclic_container(strategy: AutowireStrategy) -> Container {
    let a = StructDescriptor::builder::<NodeA>()
        .with_alias("a")
        .inject_component_by_id("b", strategy.clone(), "b", |n: &mut NodeA, v: Arc<NodeB>| {
            n.b = Some(v)
        })
        .build()
        .unwrap();
    let b = StructDescriptor::builder::<NodeB>()
        .with_alias("b")
        .inject_component_by_id("a", strategy.clone(), "a", |n: &mut NodeB, v: Arc<NodeA>| {
            n.a = Some(v)
        })
        .build()
        .unwrap();
    let registry = RegistryBuilder::new()
        .with(&strategy, a)
        .unwrap()
        .with(&strategy, b)
        .unwrap()
        .freeze();
    Container::new(Arc::new(registry), Arc::new(Document::empty()))
}

/// 前两次调用在屏障处会合，之后直接构造
fn gated<T: Default + 'static>(
    entered: Arc<AtomicUsize>,
    barrier: Arc<Barrier>,
) -> impl Fn() -> T + Send + Sync + 'static {
    move || {
        if entered.fetch_add(1, Ordering::SeqCst) < 2 {
            barrier.wait();
        }
        T::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_singleton_cycle_across_threads_fails_fast() -> anyhow::Result<()> {
    let strategy = AutowireStrategy::singleton();
    let entered = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(2));

    let a = StructDescriptor::builder_with_factory(gated::<NodeA>(entered.clone(), barrier.clone()))
        .with_alias("a")
        .inject_component_by_id("b", strategy.clone(), "b", |n: &mut NodeA, v: Arc<NodeB>| {
            n.b = Some(v)
        })
        .build()?;
    let b = StructDescriptor::builder_with_factory(gated::<NodeB>(entered, barrier))
        .with_alias("b")
        .inject_component_by_id("a", strategy.clone(), "a", |n: &mut NodeB, v: Arc<NodeA>| {
            n.a = Some(v)
        })
        .build()?;
    let registry = RegistryBuilder::new().with(&strategy, a)?.with(&strategy, b)?.freeze();
    let container = Arc::new(Container::new(Arc::new(registry), Arc::new(Document::empty())));

    // 两个线程各自持有一半的单例环
    let handles: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|id| {
            let container = Arc::clone(&container);
            tokio::task::spawn_blocking(move || container.resolve("singleton", id))
        })
        .collect();

    for handle in handles {
        match handle.await? {
            Err(ResolveError::Cycle { .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
    assert_eq!(container.cached_singletons(), 0);
    Ok(())
}

#[test]
fn test_cycle_is_detected() {
    for strategy in [AutowireStrategy::normal(), AutowireStrategy::singleton()] {
        let container = cyclic_container(strategy.clone());
        match container.resolve(strategy.name(), "a") {
            Err(ResolveError::Cycle { chain }) => {
                assert_eq!(chain.matches(" -> ").count(), 2, "chain: {chain}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(container.cached_singletons(), 0);
    }
}

#[test]
fn test_bootstrap_from_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("autowire.yaml");
    std::fs::File::create(&path)?.write_all(CONFIG.as_bytes())?;
    let override_path = dir.path().join("override.json");
    std::fs::File::create(&override_path)?
        .write_all(br#"{"autowire": {"singleton": {"redis": {"param": {"db": 7}}}}}"#)?;

    let registry = RegistryBuilder::new()
        .with(&AutowireStrategy::singleton(), redis_descriptor(Arc::default()))?;
    let container = Bootstrapper::new()
        .with_load_options(
            LoadOptions::new()
                .with_abs_path(&path)
                .with_override(&override_path),
        )
        .with_registry(registry)
        .bootstrap()?;

    let redis = container.get::<Redis>("singleton", "redis")?;
    assert_eq!(redis.db, 7);
    assert_eq!(redis.address, "localhost:6379");
    Ok(())
}

#[test]
fn test_param_factory_value_survives_partial_config() -> anyhow::Result<()> {
    let descriptor = StructDescriptor::builder::<Redis>()
        .with_alias("seeded")
        .with_param::<RedisParam>()
        .with_param_factory(|| RedisParam {
            address: "seeded:6379".into(),
            db: 42,
        })
        .with_construct(|mut redis: Redis, param: RedisParam| {
            redis.address = param.address;
            redis.db = param.db;
            Ok::<_, std::convert::Infallible>(redis)
        })
        .build()?;
    let registry = RegistryBuilder::new()
        .with(&AutowireStrategy::normal(), descriptor)?
        .freeze();
    let document = load_sources(&[ConfigSource::yaml(
        "autowire:\n  normal:\n    seeded:\n      param:\n        address: from-config\n      replica:\n        param:\n          db: 3\n",
    )])?;
    let container = Container::new(Arc::new(registry), Arc::new(document));

    let primary = container.get::<Redis>("normal", "seeded")?;
    assert_eq!((primary.address.as_str(), primary.db), ("from-config", 42));

    let replica = container.get_named::<Redis>("normal", "seeded", "replica")?;
    assert_eq!((replica.address.as_str(), replica.db), ("seeded:6379", 3));

    let unconfigured = container.get_named::<Redis>("normal", "seeded", "standby")?;
    assert_eq!((unconfigured.address.as_str(), unconfigured.db), ("seeded:6379", 42));
    Ok(())
}

#[derive(Debug, Default)]
struct Warmup {
    overlapped: bool,
}

/// 构造时等待另一个构造者进入，最多等待 5 秒
fn warmup_descriptor(alias: &str, active: Arc<AtomicUsize>) -> StructDescriptor {
    StructDescriptor::builder_with_factory(move || {
        active.fetch_add(1, Ordering::SeqCst);
        let deadline = Instant::now() + Duration::from_secs(5);
        while active.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        Warmup {
            overlapped: active.load(Ordering::SeqCst) >= 2,
        }
    })
    .with_sdid(format!("warmup/{alias}.Warmup"))
    .with_alias(alias)
    .build()
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_distinct_singletons_construct_concurrently() -> anyhow::Result<()> {
    let active = Arc::new(AtomicUsize::new(0));
    let strategy = AutowireStrategy::singleton();
    let registry = RegistryBuilder::new()
        .with(&strategy, warmup_descriptor("left", active.clone()))?
        .with(&strategy, warmup_descriptor("right", active))?
        .freeze();
    let container = Arc::new(Container::new(Arc::new(registry), Arc::new(Document::empty())));

    let handles: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|id| {
            let container = Arc::clone(&container);
            tokio::task::spawn_blocking(move || container.get::<Warmup>("singleton", id))
        })
        .collect();

    for handle in handles {
        assert!(handle.await??.overlapped);
    }
    assert_eq!(container.cached_singletons(), 2);
    Ok(())
}
