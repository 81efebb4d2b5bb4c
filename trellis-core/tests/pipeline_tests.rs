use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use trellis_core::{Container, Error, Next, Pipe, PipeSpec, Pipeline, pipe_instance};

type Log = Vec<String>;

// Appends "<tag>-before" on the way in and "<tag>-after" on the way out.
struct Tag(&'static str);

impl Pipe<Log> for Tag {
    fn handle(&self, mut traveler: Log, next: Next<Log, Log>, _args: &[String]) -> Result<Log, Error> {
        traveler.push(format!("{}-before", self.0));
        let mut out = next(traveler)?;
        out.push(format!("{}-after", self.0));
        Ok(out)
    }
}

fn container_with_tags() -> Container {
    let container = Container::new();
    container.bind_factory("a", |_, _| Ok(pipe_instance(Tag("A"))));
    container.bind_factory("b", |_, _| Ok(pipe_instance(Tag("B"))));
    container
}

#[test]
fn test_onion_ordering() {
    let result = Pipeline::<Log>::new(container_with_tags())
        .send(Vec::new())
        .through(["a", "b"])
        .then(|mut log| {
            log.push("D".to_string());
            Ok(log)
        })
        .unwrap();

    assert_eq!(
        result,
        vec!["A-before", "B-before", "D", "B-after", "A-after"]
    );
}

#[test]
fn test_short_circuit_skips_rest_of_chain() {
    struct Halt;

    impl Pipe<Log> for Halt {
        fn handle(&self, mut traveler: Log, _next: Next<Log, Log>, _args: &[String]) -> Result<Log, Error> {
            traveler.push("halted".to_string());
            Ok(traveler)
        }
    }

    let container = container_with_tags();
    container.bind_factory("halt", |_, _| Ok(pipe_instance(Halt)));

    let destination_ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&destination_ran);

    let result = Pipeline::<Log>::new(container)
        .send(Vec::new())
        .through(["halt", "b"])
        .then(move |log| {
            flag.store(true, Ordering::SeqCst);
            Ok(log)
        })
        .unwrap();

    assert_eq!(result, vec!["halted"]);
    assert!(!destination_ran.load(Ordering::SeqCst));
}

#[test]
fn test_named_pipe_receives_literal_args() {
    struct Suffix;

    impl Pipe<String> for Suffix {
        fn handle(
            &self,
            traveler: String,
            next: Next<String, String>,
            args: &[String],
        ) -> Result<String, Error> {
            next(format!("{}{}", traveler, args.join("+")))
        }
    }

    let container = Container::new();
    container.bind_factory("suffix", |_, _| Ok(pipe_instance(Suffix)));

    let result = Pipeline::<String>::new(container)
        .send("x".to_string())
        .through(["suffix:one,two"])
        .then(Ok)
        .unwrap();

    assert_eq!(result, "xone+two");
}

#[test]
fn test_unresolvable_pipe_fails_whole_pipeline() {
    let result = Pipeline::<Log>::new(Container::new())
        .send(Vec::new())
        .through(["missing"])
        .then(Ok);

    assert!(matches!(result, Err(Error::BindingResolution(_))));
}

#[test]
fn test_handler_specs_mix_with_named_specs() {
    let container = container_with_tags();

    let result = Pipeline::<Log>::new(container)
        .send(Vec::new())
        .through(vec![
            PipeSpec::parse("a"),
            PipeSpec::handler(Tag("inline")),
        ])
        .then(|mut log| {
            log.push("D".to_string());
            Ok(log)
        })
        .unwrap();

    assert_eq!(
        result,
        vec!["A-before", "inline-before", "D", "inline-after", "A-after"]
    );
}

#[test]
fn test_via_records_method_name_without_changing_dispatch() {
    let result = Pipeline::<Log>::new(container_with_tags())
        .send(Vec::new())
        .through(["a"])
        .via("process")
        .then(|mut log| {
            log.push("D".to_string());
            Ok(log)
        })
        .unwrap();

    assert_eq!(result, vec!["A-before", "D", "A-after"]);
}

#[test]
fn test_shared_pipes_resolve_once() {
    let container = Container::new();
    let factory_calls = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&factory_calls);
    container.singleton_factory("a", move |_, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(pipe_instance(Tag("A")))
    });

    let run = |container: &Container| {
        Pipeline::<Log>::new(container.clone())
            .send(Vec::new())
            .through(["a"])
            .then(Ok)
            .unwrap()
    };

    assert_eq!(run(&container), vec!["A-before", "A-after"]);
    assert_eq!(run(&container), vec!["A-before", "A-after"]);
    assert_eq!(factory_calls.load(Ordering::SeqCst), 1);
}
