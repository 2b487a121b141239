use lambda_step::{
    build, enumerate_redexes, format, load_environment, normalize, parse, select_redex, step_at,
    sexpr::Sexpr, Address, Environment, ParseError, Policy, Session, Step, Style, Term,
};
use rstest::rstest;

fn alpha_eq(term: &Term, text: &str) -> bool {
    term.alpha_eq(&parse(text).unwrap())
}

#[rstest]
#[case("x")]
#[case("(lambda (x y) x)")]
#[case("(lambda (x) (lambda (y) (x y))) y")]
#[case("λf.(λx.f (x x)) (λx.f (x x))")]
#[case("PLUS 2 (SUCC 3)")]
#[case("(lambda (x) x y) (lambda (y) (lambda (x) y x))")]
fn named_output_parses_back(#[case] text: &str) {
    let term = parse(text).unwrap();
    let again = parse(&format(&term, Style::Named)).unwrap();
    assert!(term.alpha_eq(&again));
}

#[test]
fn singleton_unwrap() {
    let wrapped = Sexpr::List(vec![Sexpr::atom("x")]);
    assert_eq!(build(&wrapped, &[]), build(&Sexpr::atom("x"), &[]));
}

#[test]
fn application_associates_left() {
    let term = parse("x y z").unwrap();
    assert_eq!(
        term,
        Term::app(Term::app(Term::free_var("x"), Term::free_var("y")), Term::free_var("z"))
    );
    assert_eq!(format(&term, Style::Named), "((x y) z)");
}

#[test]
fn lambda_desugaring() {
    assert_eq!(format(&parse("(lambda (x y) x)").unwrap(), Style::Named), "λx.λy.x");
}

#[rstest]
#[case("(lambda (x) )", ParseError::EmptyExpression)]
#[case("(lambda () x)", ParseError::MissingParameters)]
fn malformed_lambdas(#[case] text: &str, #[case] expected: ParseError) {
    assert_eq!(parse(text), Err(expected));
}

#[test]
fn beta_reduction_avoids_capture() {
    let term = parse("((λx.(λy.(x y))) y)").unwrap();
    let reduced = step_at(&term, &Address::root(), &Environment::new()).unwrap().unwrap();
    assert_ne!(reduced, parse("λy.(y y)").unwrap());
    assert!(alpha_eq(&reduced, "λy'.(y y')"));
}

#[test]
fn numeral_expansion() {
    let reduced = step_at(&parse("3").unwrap(), &Address::root(), &Environment::new()).unwrap().unwrap();
    assert!(alpha_eq(&reduced, "λf.λx.(f (f (f x)))"));
}

#[test]
fn environment_lookup() {
    let env = load_environment(vec![("I", "(lambda (x) x)")]).unwrap();
    let reduced = step_at(&parse("I").unwrap(), &Address::root(), &env).unwrap().unwrap();
    assert!(alpha_eq(&reduced, "λx.x"));
}

#[test]
fn bare_unbound_variable_is_not_a_redex() {
    let term = parse("(lambda (x) x) a").unwrap();
    let arg = Address::from(vec![Step::Arg]);
    assert_eq!(step_at(&term, &arg, &Environment::new()), Ok(None));
}

#[test]
fn stepping_never_mutates_its_input() {
    let env = Environment::prelude().unwrap();
    let term = parse("(lambda (x) x x) (I 2)").unwrap();
    let before = term.clone();
    for address in enumerate_redexes(&term, &env) {
        step_at(&term, &address, &env).unwrap();
        assert_eq!(term, before);
    }
}

#[test]
fn every_enumerated_redex_steps() {
    let env = Environment::prelude().unwrap();
    let term = parse("S K (K I) (PLUS 1 2) ((lambda (y) y) 0)").unwrap();
    let redexes = enumerate_redexes(&term, &env);
    assert!(!redexes.is_empty());
    for address in &redexes {
        assert!(step_at(&term, address, &env).unwrap().is_some(), "{} did not step", address);
    }
    let mut sorted = redexes.clone();
    sorted.sort();
    assert_eq!(sorted, redexes);
}

#[rstest]
#[case("PLUS 2 3", "5")]
#[case("MULT 2 3", "6")]
#[case("POW 2 3", "8")]
#[case("PRED 3", "2")]
#[case("FST (PAIR 1 2)", "1")]
#[case("IF (ISZERO 0) 4 7", "4")]
fn church_arithmetic(#[case] text: &str, #[case] expected: &str) {
    let env = Environment::prelude().unwrap();
    let term = parse(text).unwrap();
    let result = normalize(&term, &env, Policy::NORMAL_ORDER, 1000);
    assert!(result.normal_form);

    let expected_term = parse(expected).unwrap();
    let expected = normalize(&expected_term, &env, Policy::NORMAL_ORDER, 10);
    assert!(result.last(&term).alpha_eq(expected.last(&expected_term)));
}

#[test]
fn strategies_agree_on_terminating_terms() {
    let env = Environment::prelude().unwrap();
    let term = parse("SUCC (K 1 2)").unwrap();
    let mut results = Policy::ALL
        .iter()
        .map(|policy| normalize(&term, &env, *policy, 1000));
    let first = results.next().unwrap();
    for result in results {
        assert!(result.normal_form);
        assert!(result.last(&term).alpha_eq(first.last(&term)));
    }
}

#[test]
fn select_redex_picks_among_enumerated() {
    let env = Environment::new();
    let term = parse("(lambda (x) ((lambda (y) y) x)) ((lambda (z) z) w)").unwrap();
    let redexes = enumerate_redexes(&term, &env);
    assert_eq!(select_redex(&redexes, Policy::NORMAL_ORDER), Some(Address::root()));
    assert_eq!(
        select_redex(&redexes, Policy::APPLICATIVE_ORDER).map(|a| a.to_string()),
        Some("func-side/body".to_string())
    );
}

#[test]
fn session_trace() {
    let mut session = Session::new(Environment::prelude().unwrap());
    session.style = Style::Compact;
    session.load("NOT TRUE").unwrap();
    while session.step_auto().unwrap().is_some() {}

    let history = session.history().unwrap();
    let trace: Vec<String> = history.iter().map(|t| session.render(t)).collect();
    insta::assert_snapshot!(trace.join("\n"), @r"
    NOT TRUE
    (λp.p FALSE TRUE) TRUE
    TRUE FALSE TRUE
    (λt.λf.t) FALSE TRUE
    (λf.FALSE) TRUE
    FALSE
    λt.λf.f
    ");
}
