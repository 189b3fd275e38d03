use std::{error::Error, fs, path::Path};

use mptower::{divmod, get_context, local_context, py_divmod, Context, Flags, RoundingMode, RunError, Value};
use num_bigint::BigInt;
use num_rational::BigRational;
use rug::Float;

/// Which entry point a fixture calls.
#[derive(Debug, Clone, Copy)]
enum Call {
    /// `divmod(x, y)`: the tower dispatcher under the fixture context.
    Divmod,
    /// Operator-level `divmod` with the fixture context installed as current.
    PyDivmod,
}

/// Represents the expected outcome of a test fixture
#[derive(Debug, Clone)]
enum Expectation {
    /// Expect exception with specific repr, e.g. `ZeroDivisionError('division or modulo by zero')`
    Raise(String),
    /// Expect successful execution, check the `(quotient, remainder)` reprs
    Return(String),
}

/// A parsed fixture file.
#[derive(Debug)]
struct Fixture {
    ctx: Context,
    call: Call,
    x: Value,
    y: Value,
    expectation: Expectation,
    /// Flags the context must hold afterwards, when a `# flags=` line is present.
    flags: Option<Flags>,
}

/// Parse a fixture file.
///
/// Layout, one item per line:
/// - optional first line `# context: precision=10 round=RoundDown emin=-100 emax=10 traps=INEXACT|DIVZERO`
///   (also `ieee=64` and `subnormalize=true`)
/// - the call, `divmod(x, y)` or `py_divmod(x, y)`
/// - optional `# flags=DIVZERO|INVALID` (use `# flags=` for no flags)
/// - the expectation as the LAST line: `# Return=(q, r)` or `# Raise=ExcType('message')`
fn parse_fixture(content: &str) -> Fixture {
    let lines: Vec<&str> = content.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    assert!(lines.len() >= 2, "fixture needs a call and an expectation");

    let mut idx = 0;
    let ctx = if let Some(settings) = lines[0].strip_prefix("# context:") {
        idx += 1;
        parse_context(settings)
    } else {
        Context::new()
    };

    let (call, args) = if let Some(rest) = lines[idx].strip_prefix("py_divmod(") {
        (Call::PyDivmod, rest)
    } else if let Some(rest) = lines[idx].strip_prefix("divmod(") {
        (Call::Divmod, rest)
    } else {
        panic!("unknown call: {}", lines[idx]);
    };
    let args = args.strip_suffix(')').expect("call must end with ')'");
    let parts = split_top_level(args);
    assert_eq!(parts.len(), 2, "divmod takes two operands: {args}");
    let x = parse_value(parts[0]);
    let y = parse_value(parts[1]);

    let last_line = lines[lines.len() - 1];
    let expectation = if let Some(expected) = last_line.strip_prefix("# Return=") {
        Expectation::Return(expected.to_string())
    } else if let Some(expected) = last_line.strip_prefix("# Raise=") {
        Expectation::Raise(expected.to_string())
    } else {
        panic!("Expectation comment must be on the LAST line: {last_line}");
    };

    let flags = lines[idx + 1..lines.len() - 1]
        .iter()
        .find_map(|l| l.strip_prefix("# flags="))
        .map(parse_flags);

    Fixture {
        ctx,
        call,
        x,
        y,
        expectation,
        flags,
    }
}

fn parse_context(settings: &str) -> Context {
    let mut ctx = Context::new();
    for setting in settings.split_whitespace() {
        let (key, value) = setting
            .split_once('=')
            .unwrap_or_else(|| panic!("invalid context setting: {setting}"));
        match key {
            "ieee" => {
                // keep traps set earlier on the line
                let traps = ctx.traps();
                ctx = Context::ieee(value.parse().unwrap()).unwrap().with_traps(traps);
            }
            "precision" => ctx.set_precision(value.parse().unwrap()).unwrap(),
            "round" => ctx.set_round(value.parse::<RoundingMode>().unwrap()).unwrap(),
            "emin" => ctx.set_emin(value.parse().unwrap()).unwrap(),
            "emax" => ctx.set_emax(value.parse().unwrap()).unwrap(),
            "subnormalize" => ctx.set_subnormalize(value.parse().unwrap()).unwrap(),
            "traps" => ctx.set_traps(parse_flags(value)).unwrap(),
            "readonly" => {
                if value.parse().unwrap() {
                    ctx = ctx.readonly_copy();
                }
            }
            _ => panic!("unknown context setting: {key}"),
        }
    }
    ctx
}

fn parse_flags(s: &str) -> Flags {
    s.split('|')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .fold(Flags::empty(), |flags, name| {
            flags | Flags::from_name(name).unwrap_or_else(|| panic!("unknown flag: {name}"))
        })
}

/// Splits `s` on commas that are not inside parentheses or quotes.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0;
    let mut in_quote = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth -= 1,
            ',' if !in_quote && depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

/// Parses an operand literal: `None`, `True`, `7`, `-2.5`, `float('inf')`, `'text'`,
/// `mpz(7)`, `mpq(7,2)`, `mpfr('5.0')`, `mpfr('5.0',100)` or `mpc(1.0,2.0)`.
fn parse_value(s: &str) -> Value {
    if let Some(inner) = call_args(s, "mpz") {
        return Value::Mpz(inner.parse::<BigInt>().unwrap());
    }
    if let Some(inner) = call_args(s, "mpq") {
        let parts = split_top_level(inner);
        let numer: BigInt = parts[0].parse().unwrap();
        let denom: BigInt = parts.get(1).map_or_else(|| BigInt::from(1), |d| d.parse().unwrap());
        return Value::Mpq(BigRational::new(numer, denom));
    }
    if let Some(inner) = call_args(s, "mpfr") {
        let parts = split_top_level(inner);
        let digits = parts[0].trim_matches('\'');
        let prec = parts.get(1).map_or(53, |p| p.parse().unwrap());
        return Value::Mpfr(Float::with_val(prec, Float::parse(digits).unwrap()));
    }
    if let Some(inner) = call_args(s, "mpc") {
        let parts = split_top_level(inner);
        return Value::mpc(parse_f64(parts[0]), parse_f64(parts[1]));
    }
    if let Some(inner) = call_args(s, "float") {
        return Value::Float(parse_f64(inner.trim_matches('\'')));
    }
    match s {
        "None" => Value::None,
        "True" => Value::Bool(true),
        "False" => Value::Bool(false),
        _ if s.starts_with('\'') => Value::Str(s.trim_matches('\'').to_string()),
        _ if s.contains(|c: char| c == '.' || c == 'e') => Value::Float(parse_f64(s)),
        _ => Value::Int(s.parse().unwrap_or_else(|_| panic!("invalid operand: {s}"))),
    }
}

fn call_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?.strip_prefix('(')?.strip_suffix(')')
}

fn parse_f64(s: &str) -> f64 {
    s.parse().unwrap_or_else(|_| panic!("invalid float: {s}"))
}

fn format_error(err: &RunError) -> String {
    match err {
        RunError::Exc(exc) => exc.to_string(),
        other => panic!("expected an exception, got: {other}"),
    }
}

/// Run a test with the given fixture and validate the result against its expectation.
fn run_test(path: &Path, fixture: Fixture) {
    let test_name = path.strip_prefix("test_cases/").unwrap_or(path).display().to_string();
    let Fixture {
        mut ctx,
        call,
        x,
        y,
        expectation,
        flags,
    } = fixture;

    let result = match call {
        Call::Divmod => divmod(&x, &y, Some(&mut ctx)),
        Call::PyDivmod => {
            let _guard = local_context(ctx.clone());
            let result = py_divmod(&x, &y);
            ctx = get_context();
            result
        }
    };

    match (&expectation, result) {
        (Expectation::Return(expected), Ok((quot, rem))) => {
            let output = format!("({}, {})", quot.py_repr(), rem.py_repr());
            pretty_assertions::assert_eq!(output, *expected, "[{test_name}] result mismatch");
        }
        (Expectation::Raise(expected), Err(err)) => {
            let output = format_error(&err);
            pretty_assertions::assert_eq!(output, *expected, "[{test_name}] exception mismatch");
        }
        (Expectation::Return(expected), Err(err)) => {
            panic!("[{test_name}] expected {expected}, got error: {err}");
        }
        (Expectation::Raise(expected), Ok((quot, rem))) => {
            panic!("[{test_name}] expected {expected}, got ({quot}, {rem})");
        }
    }

    if let Some(expected) = flags {
        assert_eq!(ctx.flags(), expected, "[{test_name}] flags mismatch");
    }
}

/// Test function that runs each fixture through the divmod entry points
fn run_test_cases(path: &Path) -> Result<(), Box<dyn Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let content = fs::read_to_string(path)?;
    let fixture = parse_fixture(&content);
    run_test(path, fixture);
    Ok(())
}

// Generate tests for all fixture files using datatest-stable harness macro
datatest_stable::harness!(run_test_cases, "test_cases", r"^.*\.py$");
