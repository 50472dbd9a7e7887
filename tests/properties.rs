use fun::{
    Config,
    context::Context,
    error::ErrorKind,
    eval::{self, Interpreter, Value},
    parse_whole_expr, parser, run,
};
use pretty_assertions::assert_eq;

fn eval(input: &str) -> String {
    run(input, &Config::default()).unwrap()
}

fn same_tree(a: &str, b: &str) -> bool {
    let mut ctx_a = Context::new();
    let mut ctx_b = Context::new();
    let expr_a = parse_whole_expr(&mut ctx_a, a).unwrap();
    let expr_b = parse_whole_expr(&mut ctx_b, b).unwrap();
    ctx_a.same_expr(expr_a, &ctx_b, expr_b)
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(eval("1 + 2 * 3"), "7");
}

#[test]
fn exponentiation_is_right_associative() {
    assert_eq!(eval("2 ^ 3 ^ 2"), "512");
}

#[test]
fn non_associative_operators_cannot_be_mixed() {
    let err = run("1 < 2 == 3", &Config::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(matches!(
        err,
        fun::error::Error::Parser(parser::Error::NonAssociative { .. })
    ));
}

#[test]
fn application_binds_tighter_than_operators() {
    assert!(same_tree("f x + 1", "(f x) + 1"));
    assert!(!same_tree("f x + 1", "f (x + 1)"));
}

#[test]
fn single_element_brackets_are_grouping() {
    assert!(same_tree("(1)", "1"));
    assert_eq!(eval("(1)"), "1");
    assert_eq!(eval("(1, 2)"), "(1, 2)");
}

#[test]
fn list_literals_are_cons_chains() {
    assert!(same_tree("[1, 2, 3]", "1 : 2 : 3 : []"));
    assert_eq!(eval("[1, 2, 3] == 1 : 2 : 3 : []"), "true");
}

#[test]
fn first_matching_case_option_wins() {
    assert_eq!(eval("case 1 of 1 -> 10 | 1 -> 20"), "10");
}

#[test]
fn unmatched_case_is_non_exhaustive() {
    let err = run("case 3 of 1 -> 10", &Config::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Eval);
    assert_eq!(err.to_string(), "non-exhaustive patterns in case");
}

#[test]
fn unreferenced_bindings_are_never_forced() {
    assert_eq!(eval("let broken = 1 < true in 5"), "5");
    assert_eq!(eval("let missing = nowhere in 5"), "5");
    assert_eq!(eval("let spin = spin in 5"), "5");
    assert_eq!(eval("let boom = 2 ^ 100 in (\\_ -> 5) boom"), "5");
}

#[test]
fn shared_thunk_is_evaluated_once() {
    let mut ctx = Context::new();
    let expr = parse_whole_expr(&mut ctx, "let x = 6 * 7 in (\\y -> y + y) x").unwrap();
    let mut interpreter = Interpreter::new(&ctx, Config::default());
    let value = interpreter.evaluate(expr).unwrap();
    assert!(matches!(value, Value::Integer(84)));

    // `x` and the argument thunk for `y` are each evaluated once; the second
    // use of `y` is answered from its memo.
    let stats = interpreter.stats();
    assert_eq!(stats.thunks_created, 2);
    assert_eq!(stats.thunks_evaluated, 2);
    assert_eq!(stats.memo_hits, 1);
}

#[test]
fn serialized_trees_parse_back_identically() {
    let programs = [
        "1 + 2 * 3 - 4",
        "\\(a, b) -> a : b : []",
        "let f = \\x -> if x < 1 then 0 else f (x - 1) in f 3",
        "case xs of [] -> 0 | h : _ -> h ^ 2",
        "(case x of 1 -> (), (2, [3, 4]))",
    ];
    for program in programs {
        let mut ctx = Context::new();
        let expr = parse_whole_expr(&mut ctx, program).unwrap();
        let printed = expr.display(&ctx).to_string();

        let mut reparsed_ctx = Context::new();
        let reparsed = parse_whole_expr(&mut reparsed_ctx, &printed).unwrap();
        assert!(
            ctx.same_expr(expr, &reparsed_ctx, reparsed),
            "{program} printed as {printed}"
        );
    }
}

#[test]
fn errors_carry_positions() {
    let err = run("let x = 1 in\n  x + y", &Config::default()).unwrap_err();
    assert!(matches!(
        err,
        fun::error::Error::Eval(eval::Error::UnboundVariable(..))
    ));
    let span = err.span();
    assert_eq!((span.start.line, span.start.column), (2, 7));
}

#[test]
fn default_recursion_limit_is_reported_on_a_small_stack() {
    let outcome = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| run("let loop = \\n -> loop (n + 1) in loop 0", &Config::default()))
        .unwrap()
        .join()
        .unwrap();
    let err = outcome.unwrap_err();
    assert!(matches!(
        err,
        fun::error::Error::Eval(eval::Error::RecursionLimit(Config::DEFAULT_MAX_DEPTH, _))
    ));
    assert_eq!(err.to_string(), "recursion limit of 2000 exceeded");
}

#[test]
fn case_subject_is_shared_between_options() {
    let mut ctx = Context::new();
    let expr = parse_whole_expr(&mut ctx, "case 2 * 3 of 1 -> 0 | 2 -> 0 | 6 -> 1").unwrap();
    let mut interpreter = Interpreter::new(&ctx, Config::default());
    assert!(matches!(interpreter.evaluate(expr), Ok(Value::Integer(1))));

    let stats = interpreter.stats();
    assert_eq!(stats.thunks_created, 1);
    assert_eq!(stats.thunks_evaluated, 1);
    assert_eq!(stats.memo_hits, 2);
}

#[test]
fn failed_case_options_leave_no_bindings() {
    let err = run("case (1, 2) of (x, 3) -> 0 | (_, y) -> x", &Config::default()).unwrap_err();
    assert!(matches!(
        err,
        fun::error::Error::Eval(eval::Error::UnboundVariable(ref name, _)) if name == "x"
    ));
}
