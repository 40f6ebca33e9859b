//! A `nom`-based parser for the JSON path dialect.
use crate::ast::{Expression, PathSegment, Selection};
use crate::error::JPathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, u64 as nom_u64},
    combinator::{map, not, recognize, value},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded},
};
use serde_json::{Value, json};

// --- Main Public Parser ---

pub fn parse_expression(input: &str) -> Result<Expression, JPathError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(JPathError::Parse(
            input.to_string(),
            format!("Unconsumed input: '{}'", rem),
        )),
        Err(e) => Err(JPathError::Parse(input.to_string(), e.to_string())),
    }
}

// --- Combinators ---

fn expression(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(literal, Expression::Literal),
        function_call, // must run before selection so `upper(` is not a path
        map(selection, Expression::Selection),
    )))
    .parse(input)
}

// --- Literals ---

/// Matches a keyword that is not the prefix of a longer identifier, so that
/// e.g. `nullable` still parses as a path.
fn keyword<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    nom::sequence::terminated(
        tag(word),
        not(take_while1(|c: char| c.is_alphanumeric() || c == '_')),
    )
}

fn boolean(input: &str) -> IResult<&str, Value> {
    alt((
        value(json!(true), keyword("true")),
        value(json!(false), keyword("false")),
    ))
    .parse(input)
}

fn null(input: &str) -> IResult<&str, Value> {
    value(json!(null), keyword("null")).parse(input)
}

fn string_literal(input: &str) -> IResult<&str, Value> {
    map(
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        |s: &str| json!(s),
    )
    .parse(input)
}

fn number(input: &str) -> IResult<&str, Value> {
    map(double, Value::from).parse(input)
}

fn literal(input: &str) -> IResult<&str, Value> {
    alt((null, boolean, string_literal, number)).parse(input)
}

// --- Paths ---

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn segment(input: &str) -> IResult<&str, PathSegment> {
    alt((
        map(preceded(tag(".."), identifier), |s| {
            PathSegment::Descendant(s.to_string())
        }),
        value(PathSegment::Wildcard, tag(".*")),
        map(preceded(char('.'), identifier), |s| {
            PathSegment::Key(s.to_string())
        }),
        value(PathSegment::Wildcard, tag("[*]")),
        map(delimited(char('['), nom_u64, char(']')), |i| {
            PathSegment::Index(i as usize)
        }),
        map(
            delimited(tag("['"), take_while1(|c| c != '\''), tag("']")),
            |s: &str| PathSegment::Key(s.to_string()),
        ),
    ))
    .parse(input)
}

fn rooted_path(input: &str) -> IResult<&str, Selection> {
    map(preceded(char('$'), many0(segment)), |segments| {
        Selection::Path {
            rooted: true,
            segments,
        }
    })
    .parse(input)
}

fn relative_path(input: &str) -> IResult<&str, Selection> {
    map(pair(identifier, many0(segment)), |(head, mut tail)| {
        let mut segments = vec![PathSegment::Key(head.to_string())];
        segments.append(&mut tail);
        Selection::Path {
            rooted: false,
            segments,
        }
    })
    .parse(input)
}

fn selection(input: &str) -> IResult<&str, Selection> {
    alt((
        // `$name` is a variable; `$`, `$.a`, `$[0]` are rooted paths.
        map(preceded(char('$'), identifier), |name| {
            Selection::Variable(name.to_string())
        }),
        rooted_path,
        value(Selection::CurrentContext, char('.')),
        relative_path,
    ))
    .parse(input)
}

// --- Function Calls ---

fn function_call(input: &str) -> IResult<&str, Expression> {
    let (input, name) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        char(')'),
    )
    .parse(input)?;

    Ok((
        input,
        Expression::FunctionCall {
            name: name.to_string(),
            args,
        },
    ))
}

/// A combinator that consumes whitespace around `inner`.
fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(input: &str) -> Vec<PathSegment> {
        match parse_expression(input).unwrap() {
            Expression::Selection(Selection::Path { segments, .. }) => segments,
            other => panic!("expected a path, got {:?}", other),
        }
    }

    #[test]
    fn parses_rooted_and_relative_paths() {
        assert_eq!(path("$"), vec![]);
        assert_eq!(path("$.a"), vec![PathSegment::Key("a".to_string())]);
        assert_eq!(
            path("items[0].name"),
            vec![
                PathSegment::Key("items".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("name".to_string()),
            ]
        );
    }

    #[test]
    fn parses_wildcards_and_descendants() {
        assert_eq!(
            path("$.items[*]"),
            vec![PathSegment::Key("items".to_string()), PathSegment::Wildcard]
        );
        assert_eq!(
            path("$..price"),
            vec![PathSegment::Descendant("price".to_string())]
        );
        assert_eq!(path("$.*"), vec![PathSegment::Wildcard]);
    }

    #[test]
    fn parses_bracket_keys() {
        assert_eq!(
            path("$['odd key']"),
            vec![PathSegment::Key("odd key".to_string())]
        );
    }

    #[test]
    fn dollar_identifier_is_a_variable() {
        assert_eq!(
            parse_expression("$total").unwrap(),
            Expression::Selection(Selection::Variable("total".to_string()))
        );
    }

    #[test]
    fn parses_literals_and_calls() {
        assert_eq!(
            parse_expression("'hi'").unwrap(),
            Expression::Literal(json!("hi"))
        );
        assert!(matches!(
            parse_expression("concat('a', $.b)").unwrap(),
            Expression::FunctionCall { .. }
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_expression("$.a !").is_err());
    }
}
