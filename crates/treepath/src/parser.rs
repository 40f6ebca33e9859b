//! A `nom`-based parser for tree-path expressions.
use crate::ast::{Axis, Expression, LocationPath, NodeTest, Predicate, Step};
use crate::error::TreePathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, map_res, opt, recognize, value},
    multi::{many0, separated_list0},
    number::complete::double,
    sequence::{delimited, pair, preceded, separated_pair},
};

// --- Main Public Parser ---

pub fn parse_expression(input: &str) -> Result<Expression, TreePathError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(TreePathError::Parse(
            input.to_string(),
            format!("Unconsumed input: '{}'", rem),
        )),
        Err(e) => Err(TreePathError::Parse(input.to_string(), e.to_string())),
    }
}

/// Parses a bare location path, as used by match patterns.
pub(crate) fn parse_path(input: &str) -> Result<LocationPath, TreePathError> {
    match location_path(input.trim()) {
        Ok(("", path)) => Ok(path),
        Ok((rem, _)) => Err(TreePathError::Parse(
            input.to_string(),
            format!("Unconsumed input: '{}'", rem),
        )),
        Err(e) => Err(TreePathError::Parse(input.to_string(), e.to_string())),
    }
}

// --- Combinators ---

fn expression(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(string_literal, Expression::Literal),
        function_call,
        variable,
        map(location_path, Expression::Path),
        map(double, Expression::Number),
    )))
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

fn variable(input: &str) -> IResult<&str, Expression> {
    map(preceded(char('$'), identifier), |name| {
        Expression::Variable(name.to_string())
    })
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '.'),
    ))
    .parse(input)
}

fn qname(input: &str) -> IResult<&str, &str> {
    recognize(pair(name_part, opt(preceded(char(':'), name_part)))).parse(input)
}

/// One half of a qualified name. Unlike [`identifier`], `.` is excluded so
/// that `para.` leaves the dot for the path parser.
fn name_part(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '-'),
    ))
    .parse(input)
}

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

// --- Location Paths ---

pub(crate) fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        value(NodeTest::Text, tag("text()")),
        value(NodeTest::Comment, tag("comment()")),
        value(
            NodeTest::ProcessingInstruction,
            tag("processing-instruction()"),
        ),
        value(NodeTest::AnyNode, tag("node()")),
        value(NodeTest::Wildcard, char('*')),
        map(qname, |s| NodeTest::Name(s.to_string())),
    ))
    .parse(input)
}

fn predicate(input: &str) -> IResult<&str, Predicate> {
    delimited(
        char('['),
        alt((
            map_res(
                take_while1(|c: char| c.is_ascii_digit()),
                |d: &str| d.parse::<usize>().map(Predicate::Position),
            ),
            map(
                separated_pair(
                    preceded(char('@'), qname),
                    ws(char('=')),
                    string_literal,
                ),
                |(name, value)| Predicate::AttributeEquals(name.to_string(), value),
            ),
            map(qname, |name| Predicate::HasChild(name.to_string())),
        )),
        char(']'),
    )
    .parse(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    alt((
        map(tag(".."), |_| Step {
            axis: Axis::Parent,
            node_test: NodeTest::AnyNode,
            predicates: vec![],
        }),
        map(char('.'), |_| Step {
            axis: Axis::SelfAxis,
            node_test: NodeTest::AnyNode,
            predicates: vec![],
        }),
        map(
            pair(preceded(char('@'), node_test), many0(predicate)),
            |(node_test, predicates)| Step {
                axis: Axis::Attribute,
                node_test,
                predicates,
            },
        ),
        map(pair(node_test, many0(predicate)), |(node_test, predicates)| {
            Step {
                axis: Axis::Child,
                node_test,
                predicates,
            }
        }),
    ))
    .parse(input)
}

/// The `//` separator desugars into an explicit any-descendant step.
fn descendant_marker() -> Step {
    Step {
        axis: Axis::Descendant,
        node_test: NodeTest::AnyNode,
        predicates: vec![],
    }
}

pub(crate) fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let (rest, lead) = opt(alt((tag("//"), tag("/")))).parse(input)?;
    let (rest, first) = opt(step).parse(rest)?;

    let mut steps = Vec::new();
    match (lead, first) {
        (Some("/"), None) => {
            // The pattern "/" alone: the document root.
            return Ok((
                rest,
                LocationPath {
                    is_absolute: true,
                    steps,
                },
            ));
        }
        (Some("//"), Some(s)) => {
            steps.push(descendant_marker());
            steps.push(s);
        }
        (_, Some(s)) => steps.push(s),
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Fail,
            )));
        }
    }

    let (rest, more) = many0(pair(alt((tag("//"), tag("/"))), step)).parse(rest)?;
    for (sep, s) in more {
        if sep == "//" {
            steps.push(descendant_marker());
        }
        steps.push(s);
    }

    Ok((
        rest,
        LocationPath {
            is_absolute: lead.is_some(),
            steps,
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

    #[test]
    fn parses_simple_paths() {
        assert!(parse_expression("para").is_ok());
        assert!(parse_expression("/doc/section/para").is_ok());
        assert!(parse_expression("//para").is_ok());
        assert!(parse_expression("@id").is_ok());
        assert!(parse_expression(".").is_ok());
        assert!(parse_expression("../title").is_ok());
        assert!(parse_expression("text()").is_ok());
    }

    #[test]
    fn parses_predicates() {
        let expr = parse_expression("para[2]").unwrap();
        let Expression::Path(path) = expr else {
            panic!("expected a path");
        };
        assert_eq!(path.steps[0].predicates, vec![Predicate::Position(2)]);

        assert!(parse_expression("chapter[@id='c1']/para").is_ok());
        assert!(parse_expression("chapter[title]").is_ok());
    }

    #[test]
    fn desugars_descendant_separator() {
        let Expression::Path(path) = parse_expression("doc//para").unwrap() else {
            panic!("expected a path");
        };
        assert_eq!(path.steps.len(), 3);
        assert_eq!(path.steps[1].axis, Axis::Descendant);
    }

    #[test]
    fn parses_functions_and_literals() {
        assert!(parse_expression("concat('a', 'b')").is_ok());
        assert!(parse_expression("count(para)").is_ok());
        assert!(parse_expression("'hello'").is_ok());
        assert!(parse_expression("42").is_ok());
        assert!(parse_expression("$width").is_ok());
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_expression("para]").is_err());
    }
}
