//! 依赖注入容器的集成测试

use futures_util::future;
use hello_core::infrastructure::container::{
    BoxError, ContainerError, Dependency, ScopeKey, ServiceContainer, ServiceDefinition,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 测试用的服务trait
trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

struct Polite(&'static str);

impl Greeter for Polite {
    fn greet(&self) -> String {
        self.0.to_string()
    }
}

struct Repository;

struct ServiceA {
    repository: Arc<Repository>,
}

struct ServiceB;

struct RequestContext {
    id: usize,
}

struct RequestHandler {
    context: Arc<RequestContext>,
}

type EventLog = Arc<Mutex<Vec<String>>>;

fn greeter(name: &str, text: &'static str) -> ServiceDefinition {
    ServiceDefinition::builder::<dyn Greeter>(name).build(move |_| Ok(Arc::new(Polite(text)) as Arc<dyn Greeter>))
}

fn recording_destroy(log: &EventLog, name: &'static str) -> impl Fn(&Repository) -> Result<(), BoxError> {
    let log = log.clone();
    move |_: &Repository| {
        log.lock().push(name.to_string());
        Ok(())
    }
}

#[test]
fn test_singleton_identity() {
    let container = ServiceContainer::new();
    container
        .register_singleton("repository", || Arc::new(Repository))
        .unwrap();

    let first = container.resolve::<Repository>().unwrap();
    let second = container.resolve::<Repository>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_dependency_is_shared_singleton() {
    let container = ServiceContainer::new();
    container
        .register_singleton("repository", || Arc::new(Repository))
        .unwrap();
    container
        .register(
            ServiceDefinition::builder::<ServiceA>("serviceA")
                .depends_on(Dependency::on::<Repository>())
                .build(|deps| {
                    Ok(Arc::new(ServiceA {
                        repository: deps.get::<Repository>(0)?,
                    }))
                }),
        )
        .unwrap();

    let service = container.resolve::<ServiceA>().unwrap();
    let repository = container.resolve::<Repository>().unwrap();

    assert!(Arc::ptr_eq(&service.repository, &repository));
}

#[test]
fn test_duplicate_definition_keeps_first() {
    let container = ServiceContainer::new();
    container.register(greeter("greeter", "first")).unwrap();

    let result = container.register(greeter("greeter", "second"));
    assert!(matches!(
        result,
        Err(ContainerError::DuplicateDefinition { .. })
    ));

    assert_eq!(container.definition_count(), 1);
    assert_eq!(container.resolve::<dyn Greeter>().unwrap().greet(), "first");
}

#[test]
fn test_ambiguity_resolved_by_primary() {
    let container = ServiceContainer::new();
    container.register(greeter("english", "hello")).unwrap();
    container.register(greeter("korean", "annyeong")).unwrap();

    match container.resolve::<dyn Greeter>() {
        Err(ContainerError::AmbiguousBean {
            candidates,
            primaries,
            ..
        }) => {
            assert_eq!(candidates, vec!["english", "korean"]);
            assert_eq!(primaries, 0);
        }
        _ => panic!("Expected AmbiguousBean"),
    }

    let container = ServiceContainer::new();
    container.register(greeter("english", "hello")).unwrap();
    container
        .register(
            ServiceDefinition::builder::<dyn Greeter>("korean")
                .primary()
                .build(|_| Ok(Arc::new(Polite("annyeong")) as Arc<dyn Greeter>)),
        )
        .unwrap();

    assert_eq!(container.resolve::<dyn Greeter>().unwrap().greet(), "annyeong");
}

#[test]
fn test_two_primaries_are_ambiguous() {
    let container = ServiceContainer::new();
    for (name, text) in [("a", "A"), ("b", "B")] {
        container
            .register(
                ServiceDefinition::builder::<dyn Greeter>(name)
                    .primary()
                    .build(move |_| Ok(Arc::new(Polite(text)) as Arc<dyn Greeter>)),
            )
            .unwrap();
    }

    assert!(matches!(
        container.resolve::<dyn Greeter>(),
        Err(ContainerError::AmbiguousBean { primaries: 2, .. })
    ));
}

#[test]
fn test_qualifier_selection() {
    let container = ServiceContainer::new();
    container
        .register(
            ServiceDefinition::builder::<dyn Greeter>("english")
                .qualifier("main")
                .build(|_| Ok(Arc::new(Polite("hello")) as Arc<dyn Greeter>)),
        )
        .unwrap();
    container
        .register(
            ServiceDefinition::builder::<dyn Greeter>("korean")
                .qualifier("secondary")
                .primary()
                .build(|_| Ok(Arc::new(Polite("annyeong")) as Arc<dyn Greeter>)),
        )
        .unwrap();

    // 限定符优先于 primary
    assert_eq!(container.resolve_qualified::<dyn Greeter>("main").unwrap().greet(), "hello");
    // 名称同样可以作为限定符
    assert_eq!(container.resolve_qualified::<dyn Greeter>("korean").unwrap().greet(), "annyeong");

    match container.resolve_qualified::<dyn Greeter>("missing") {
        Err(ContainerError::NoSuchBean { available, .. }) => {
            assert_eq!(available, vec!["english", "korean"]);
        }
        _ => panic!("Expected NoSuchBean"),
    }
}

#[test]
fn test_single_candidate_ignores_qualifier() {
    let container = ServiceContainer::new();
    container.register(greeter("english", "hello")).unwrap();

    assert_eq!(
        container.resolve_qualified::<dyn Greeter>("anything").unwrap().greet(),
        "hello"
    );
}

#[test]
fn test_unregistered_type() {
    let container = ServiceContainer::new();

    let err = container.resolve::<Repository>().map(|_| ()).unwrap_err();
    assert!(matches!(err, ContainerError::NoSuchBean { .. }));
    assert!(!container.is_registered::<Repository>());
}

#[test]
fn test_cycle_detected_before_construction() {
    let container = ServiceContainer::new();
    let constructed = Arc::new(AtomicUsize::new(0));

    let counter = constructed.clone();
    container
        .register(
            ServiceDefinition::builder::<ServiceA>("serviceA")
                .depends_on(Dependency::on::<ServiceB>())
                .build(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(ServiceA {
                        repository: Arc::new(Repository),
                    }))
                }),
        )
        .unwrap();

    let counter = constructed.clone();
    container
        .register(
            ServiceDefinition::builder::<ServiceB>("serviceB")
                .depends_on(Dependency::on::<ServiceA>())
                .build(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(ServiceB))
                }),
        )
        .unwrap();

    match container.resolve::<ServiceA>() {
        Err(ContainerError::CyclicDependency { chain }) => {
            assert_eq!(chain, vec!["serviceA", "serviceB", "serviceA"]);
        }
        _ => panic!("Expected CyclicDependency"),
    }
    assert!(matches!(
        container.resolve::<ServiceB>(),
        Err(ContainerError::CyclicDependency { .. })
    ));

    assert_eq!(constructed.load(Ordering::SeqCst), 0);
    assert_eq!(container.get_stats().active_singletons, 0);
}

#[test]
fn test_shutdown_destroys_in_reverse_creation_order() {
    let container = ServiceContainer::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));

    let destroy_log = log.clone();
    container
        .register(
            ServiceDefinition::builder::<ServiceA>("serviceA")
                .depends_on(Dependency::on::<Repository>())
                .destroy(move |_| {
                    destroy_log.lock().push("serviceA".to_string());
                    Ok(())
                })
                .build(|deps| {
                    Ok(Arc::new(ServiceA {
                        repository: deps.get::<Repository>(0)?,
                    }))
                }),
        )
        .unwrap();
    container
        .register(
            ServiceDefinition::builder::<Repository>("repository")
                .destroy(recording_destroy(&log, "repository"))
                .build(|_| Ok(Arc::new(Repository))),
        )
        .unwrap();
    let destroy_log = log.clone();
    container
        .register(
            ServiceDefinition::builder::<ServiceB>("serviceB")
                .destroy(move |_| {
                    destroy_log.lock().push("serviceB".to_string());
                    Ok(())
                })
                .build(|_| Ok(Arc::new(ServiceB))),
        )
        .unwrap();

    // 创建顺序：repository, serviceA, serviceB
    container.resolve::<ServiceA>().unwrap();
    container.resolve::<ServiceB>().unwrap();

    container.shutdown().unwrap();
    assert_eq!(*log.lock(), vec!["serviceB", "serviceA", "repository"]);

    // 重复关闭不会再次执行回调
    container.shutdown().unwrap();
    assert_eq!(log.lock().len(), 3);
}

#[test]
fn test_destroy_failure_does_not_stop_others() {
    let container = ServiceContainer::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));

    container
        .register(
            ServiceDefinition::builder::<Repository>("repository")
                .destroy(recording_destroy(&log, "repository"))
                .build(|_| Ok(Arc::new(Repository))),
        )
        .unwrap();
    container
        .register(
            ServiceDefinition::builder::<ServiceB>("serviceB")
                .destroy(|_| Err("socket already closed".into()))
                .build(|_| Ok(Arc::new(ServiceB))),
        )
        .unwrap();

    container.resolve::<Repository>().unwrap();
    container.resolve::<ServiceB>().unwrap();

    match container.shutdown() {
        Err(ContainerError::DestroyFailures { failures, .. }) => {
            assert_eq!(failures.len(), 1);
            assert!(matches!(
                &failures[0],
                ContainerError::DestroyCallback { name, .. } if name == "serviceB"
            ));
        }
        _ => panic!("Expected DestroyFailures"),
    }
    assert_eq!(*log.lock(), vec!["repository"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_resolution_constructs_once() {
    let container = ServiceContainer::new();
    let counter = Arc::new(AtomicUsize::new(0));

    let counter_clone = counter.clone();
    container
        .register(ServiceDefinition::builder::<Repository>("repository").build(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(Arc::new(Repository))
        }))
        .unwrap();

    // 并发解析
    let mut handles = vec![];
    for _ in 0..32 {
        let container_clone = container.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            container_clone.resolve::<Repository>().unwrap()
        }));
    }

    let results = future::join_all(handles).await;
    let instances: Vec<_> = results.into_iter().map(|r| r.unwrap()).collect();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|i| Arc::ptr_eq(i, &instances[0])));
}

fn register_request_context(container: &ServiceContainer, log: &EventLog) -> Arc<AtomicUsize> {
    let ids = Arc::new(AtomicUsize::new(0));
    let next_id = ids.clone();
    let destroy_log = log.clone();
    container
        .register(
            ServiceDefinition::builder::<RequestContext>("requestContext")
                .scoped()
                .destroy(move |context| {
                    destroy_log.lock().push(format!("requestContext#{}", context.id));
                    Ok(())
                })
                .build(move |_| {
                    Ok(Arc::new(RequestContext {
                        id: next_id.fetch_add(1, Ordering::SeqCst),
                    }))
                }),
        )
        .unwrap();
    ids
}

#[test]
fn test_scoped_instances_per_key() {
    let container = ServiceContainer::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    register_request_context(&container, &log);

    let first_key = ScopeKey::new("request-1");
    let second_key = ScopeKey::new("request-2");
    container.enter_scope(first_key.clone()).unwrap();
    container.enter_scope(second_key.clone()).unwrap();

    let first = container.resolve_scoped::<RequestContext>(&first_key).unwrap();
    let second = container.resolve_scoped::<RequestContext>(&second_key).unwrap();

    // 句柄是延迟的
    assert!(!first.is_realized());

    let a1 = first.get().unwrap();
    let a2 = first.get().unwrap();
    let b = second.get().unwrap();

    assert!(first.is_realized());
    assert!(Arc::ptr_eq(&a1, &a2));
    assert!(!Arc::ptr_eq(&a1, &b));

    // 同一作用域内的另一个句柄看到同一个实例
    let again = container.resolve_scoped::<RequestContext>(&first_key).unwrap();
    assert!(Arc::ptr_eq(&again.get().unwrap(), &a1));
}

#[test]
fn test_handle_fails_after_scope_exit() {
    let container = ServiceContainer::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    register_request_context(&container, &log);

    let key = container.begin_scope().unwrap();
    let handle = container.resolve_scoped::<RequestContext>(&key).unwrap();
    handle.get().unwrap();

    container.exit_scope(&key).unwrap();
    assert_eq!(*log.lock(), vec!["requestContext#0"]);
    assert!(!container.is_scope_active(&key));

    assert!(matches!(
        handle.get(),
        Err(ContainerError::NoActiveScope { .. })
    ));
    assert!(matches!(
        container.resolve_scoped::<RequestContext>(&key),
        Err(ContainerError::NoActiveScope { .. })
    ));
    assert!(matches!(
        container.exit_scope(&key),
        Err(ContainerError::NoActiveScope { .. })
    ));
}

#[test]
fn test_scope_entry_is_explicit() {
    let container = ServiceContainer::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    register_request_context(&container, &log);

    let key = ScopeKey::new("never-entered");
    assert!(matches!(
        container.resolve_scoped::<RequestContext>(&key),
        Err(ContainerError::NoActiveScope { .. })
    ));

    container.enter_scope(key.clone()).unwrap();
    assert!(matches!(
        container.enter_scope(key.clone()),
        Err(ContainerError::ScopeAlreadyActive { .. })
    ));

    let info = container.scope_info(&key).unwrap();
    assert!(info.is_valid());
    assert_eq!(info.instance_count, 0);
    assert_eq!(container.active_scopes().len(), 1);
}

#[test]
fn test_scoped_dependencies_share_scope_cache() {
    let container = ServiceContainer::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    register_request_context(&container, &log);

    let destroy_log = log.clone();
    container
        .register(
            ServiceDefinition::builder::<RequestHandler>("requestHandler")
                .scoped()
                .depends_on(Dependency::on::<RequestContext>())
                .destroy(move |_| {
                    destroy_log.lock().push("requestHandler".to_string());
                    Ok(())
                })
                .build(|deps| {
                    Ok(Arc::new(RequestHandler {
                        context: deps.get::<RequestContext>(0)?,
                    }))
                }),
        )
        .unwrap();

    let key = container.begin_scope().unwrap();
    let handler = container
        .resolve_scoped::<RequestHandler>(&key)
        .unwrap()
        .get()
        .unwrap();
    let context = container
        .resolve_scoped::<RequestContext>(&key)
        .unwrap()
        .get()
        .unwrap();

    assert!(Arc::ptr_eq(&handler.context, &context));
    assert_eq!(container.scope_info(&key).unwrap().instance_count, 2);

    // 依赖先创建，因此后销毁
    container.exit_scope(&key).unwrap();
    assert_eq!(*log.lock(), vec!["requestHandler", "requestContext#0"]);
}

#[test]
fn test_scoped_outside_scope_is_transient() {
    let container = ServiceContainer::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    register_request_context(&container, &log);

    let first = container.resolve::<RequestContext>().unwrap();
    let second = container.resolve::<RequestContext>().unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(container.get_stats().scoped_creations, 2);
}

#[test]
fn test_shutdown_closes_active_scopes() {
    let container = ServiceContainer::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    register_request_context(&container, &log);

    let key = container.begin_scope().unwrap();
    let handle = container.resolve_scoped::<RequestContext>(&key).unwrap();
    handle.get().unwrap();

    container.shutdown().unwrap();

    assert_eq!(*log.lock(), vec!["requestContext#0"]);
    assert!(container.active_scopes().is_empty());
    assert!(matches!(
        handle.get(),
        Err(ContainerError::ContainerShutDown)
    ));
    assert!(matches!(
        container.begin_scope(),
        Err(ContainerError::ContainerShutDown)
    ));
}

#[test]
fn test_resolution_statistics() {
    let container = ServiceContainer::new();
    container
        .register_singleton("repository", || Arc::new(Repository))
        .unwrap();
    container
        .register(
            ServiceDefinition::builder::<ServiceA>("serviceA")
                .prototype()
                .depends_on(Dependency::on::<Repository>())
                .build(|deps| {
                    Ok(Arc::new(ServiceA {
                        repository: deps.get::<Repository>(0)?,
                    }))
                }),
        )
        .unwrap();

    for _ in 0..4 {
        container.resolve::<ServiceA>().unwrap();
    }

    let stats = container.get_stats();
    assert_eq!(stats.total(), 4);
    assert_eq!(stats.prototype_creations, 4);
    assert_eq!(stats.singleton_cache_misses, 1);
    assert_eq!(stats.singleton_cache_hits, 3);
    assert_eq!(stats.registered_services, 2);
    assert!(container.get_performance_summary().contains("4 total resolutions"));
}

/// 工厂进入后发出信号，收到放行信号才返回
fn gated_definition(
    name: &str,
    entered: std::sync::mpsc::Sender<()>,
    release: std::sync::mpsc::Receiver<()>,
    log: &EventLog,
) -> ServiceDefinition {
    let release = std::sync::Mutex::new(release);
    ServiceDefinition::builder::<Repository>(name)
        .destroy(recording_destroy(log, "repository"))
        .build(move |_| {
            let _ = entered.send(());
            release
                .lock()
                .map_err(|_| "release channel poisoned")?
                .recv()
                .map_err(|_| "release sender dropped")?;
            Ok(Arc::new(Repository))
        })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_definitions_do_not_block_each_other() {
    let container = ServiceContainer::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let (entered_tx, entered_rx) = std::sync::mpsc::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel();

    container
        .register(gated_definition("repository", entered_tx, release_rx, &log))
        .unwrap();
    container
        .register_singleton("serviceB", || Arc::new(ServiceB))
        .unwrap();

    let slow_container = container.clone();
    let slow = tokio::task::spawn_blocking(move || slow_container.resolve::<Repository>().map(|_| ()));
    entered_rx.recv().unwrap();

    // repository 的工厂仍然阻塞时解析另一个定义
    let fast_container = container.clone();
    let fast = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        tokio::task::spawn_blocking(move || fast_container.resolve::<ServiceB>().map(|_| ())),
    )
    .await;

    release_tx.send(()).unwrap();
    slow.await.unwrap().unwrap();

    let fast = fast.expect("serviceB resolution blocked behind repository");
    fast.unwrap().unwrap();
}

#[test]
fn test_shutdown_destroys_singleton_created_concurrently() {
    let container = ServiceContainer::new();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let (entered_tx, entered_rx) = std::sync::mpsc::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel();

    container
        .register(gated_definition("repository", entered_tx, release_rx, &log))
        .unwrap();

    let creating = container.clone();
    let creator = std::thread::spawn(move || creating.resolve::<Repository>().map(|_| ()));
    entered_rx.recv().unwrap();

    // 工厂执行期间开始关闭
    let closing = container.clone();
    let shutdown = std::thread::spawn(move || closing.shutdown());
    std::thread::sleep(std::time::Duration::from_millis(50));
    assert!(log.lock().is_empty());

    release_tx.send(()).unwrap();
    creator.join().unwrap().unwrap();
    shutdown.join().unwrap().unwrap();

    // 关闭等待创建完成，新单例同样被销毁
    assert_eq!(*log.lock(), vec!["repository"]);
    assert_eq!(container.get_stats().active_singletons, 0);
    assert!(matches!(
        container.resolve::<Repository>(),
        Err(ContainerError::ContainerShutDown)
    ));
}
