//! Block and arrow notations, parsed with chumsky
//!
//! Every parser here matches one complete, already trimmed line (or line
//! remainder). Payloads run up to the *last* closing delimiter, which is
//! expressed with a negative lookahead on "delimiter then end of input".

use chumsky::prelude::*;

use super::ast::Direction;

type Extra<'a> = extra::Err<Rich<'a, char>>;

/// A block notation from the declaration phase, payloads still raw
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Block {
    Start,
    End,
    Connector,
    Terminator(String),
    Process(String),
    Io(String),
    Decision(String),
    SubBlock(String),
}

/// An arrow notation: `a`, optional `*label*`, optional `>`/`<`
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Arrow {
    pub label: Option<String>,
    pub direction: Direction,
}

pub(crate) fn parse_block(line: &str) -> Option<Block> {
    block().parse(line).into_result().ok()
}

pub(crate) fn parse_arrow(line: &str) -> Option<Arrow> {
    arrow().parse(line).into_result().ok()
}

/// `<arrow>!<target>`, returning the arrow and the raw target token
pub(crate) fn parse_back_reference(line: &str) -> Option<(Arrow, String)> {
    back_reference().parse(line).into_result().ok()
}

/// `ma[*label*](>|<)[`
pub(crate) fn parse_group_open(line: &str) -> Option<Arrow> {
    group_open().parse(line).into_result().ok()
}

/// `<open><payload><close>` where the payload is at least one character
fn enclosed<'a>(
    open: &'static str,
    close: char,
) -> impl Parser<'a, &'a str, String, Extra<'a>> + Clone {
    let closing = just(close).then(end());
    just(open)
        .ignore_then(
            any()
                .and_is(closing.clone().not())
                .repeated()
                .at_least(1)
                .collect::<String>(),
        )
        .then_ignore(closing)
}

fn block<'a>() -> impl Parser<'a, &'a str, Block, Extra<'a>> {
    choice((
        just("ts()").then(end()).to(Block::Start),
        just("te()").then(end()).to(Block::End),
        just("c[)").then(end()).to(Block::Connector),
        enclosed("t(", ')').map(Block::Terminator),
        enclosed("p[", ']').map(Block::Process),
        enclosed("l[", ']').map(Block::Io),
        enclosed("d<", '>').map(Block::Decision),
        enclosed("B{", '}').map(Block::SubBlock),
    ))
}

fn direction<'a>() -> impl Parser<'a, &'a str, Direction, Extra<'a>> + Clone {
    just('>')
        .to(Direction::Forward)
        .or(just('<').to(Direction::Backward))
}

/// Optional `*label` whose text stops where `tail` would match
fn label_until<'a, T>(
    tail: impl Parser<'a, &'a str, T, Extra<'a>> + Clone,
) -> impl Parser<'a, &'a str, Option<String>, Extra<'a>> + Clone {
    just('*')
        .ignore_then(any().and_is(tail.not()).repeated().collect::<String>())
        .or_not()
        .map(|label| {
            label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
        })
}

fn arrow<'a>() -> impl Parser<'a, &'a str, Arrow, Extra<'a>> {
    let tail = just('*')
        .or_not()
        .ignore_then(direction().or_not())
        .then_ignore(end());
    just('a')
        .ignore_then(label_until(tail.clone()))
        .then(tail)
        .map(|(label, direction)| Arrow {
            label,
            direction: direction.unwrap_or_default(),
        })
}

fn back_reference<'a>() -> impl Parser<'a, &'a str, (Arrow, String), Extra<'a>> {
    let tail = just('*')
        .or_not()
        .ignore_then(direction().or_not())
        .then_ignore(just('!'));
    just('a')
        .ignore_then(label_until(tail.clone()))
        .then(tail)
        .then(any().repeated().at_least(1).collect::<String>())
        .map(|((label, direction), target)| {
            let arrow = Arrow {
                label,
                direction: direction.unwrap_or_default(),
            };
            (arrow, target.trim().to_string())
        })
}

fn group_open<'a>() -> impl Parser<'a, &'a str, Arrow, Extra<'a>> {
    let tail = just('*')
        .or_not()
        .ignore_then(direction())
        .then_ignore(just('['))
        .then_ignore(end());
    just("ma")
        .ignore_then(label_until(tail.clone()))
        .then(tail)
        .map(|(label, direction)| Arrow { label, direction })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrow_of(label: Option<&str>, direction: Direction) -> Arrow {
        Arrow {
            label: label.map(str::to_string),
            direction,
        }
    }

    #[test]
    fn test_fixed_blocks() {
        assert_eq!(parse_block("ts()"), Some(Block::Start));
        assert_eq!(parse_block("te()"), Some(Block::End));
        assert_eq!(parse_block("c[)"), Some(Block::Connector));
        assert_eq!(parse_block("ts() extra"), None);
    }

    #[test]
    fn test_payload_blocks() {
        assert_eq!(
            parse_block(r#"p["Check login"]"#),
            Some(Block::Process(r#""Check login""#.to_string()))
        );
        assert_eq!(
            parse_block(r#"d<"Valid?">"#),
            Some(Block::Decision(r#""Valid?""#.to_string()))
        );
        assert_eq!(
            parse_block("l['Read input']"),
            Some(Block::Io("'Read input'".to_string()))
        );
        assert_eq!(
            parse_block(r#"t("Halt")"#),
            Some(Block::Terminator(r#""Halt""#.to_string()))
        );
    }

    #[test]
    fn test_payload_runs_to_last_delimiter() {
        assert_eq!(
            parse_block(r#"p["a[0]"]"#),
            Some(Block::Process(r#""a[0]""#.to_string()))
        );
        assert_eq!(
            parse_block(r#"d<"x > y">"#),
            Some(Block::Decision(r#""x > y""#.to_string()))
        );
    }

    #[test]
    fn test_empty_payload_is_rejected() {
        assert_eq!(parse_block("p[]"), None);
        assert_eq!(parse_block("d<>"), None);
        assert_eq!(parse_block("q[\"x\"]"), None);
    }

    #[test]
    fn test_sub_block_payload() {
        assert_eq!(
            parse_block("B{ *tm:Title *bl:left }"),
            Some(Block::SubBlock(" *tm:Title *bl:left ".to_string()))
        );
    }

    #[test]
    fn test_arrows() {
        assert_eq!(parse_arrow("a>"), Some(arrow_of(None, Direction::Forward)));
        assert_eq!(parse_arrow("a<"), Some(arrow_of(None, Direction::Backward)));
        assert_eq!(
            parse_arrow("a*Yes*>"),
            Some(arrow_of(Some("Yes"), Direction::Forward))
        );
        assert_eq!(
            parse_arrow("a*No*<"),
            Some(arrow_of(Some("No"), Direction::Backward))
        );
        assert_eq!(
            parse_arrow("a*try again>"),
            Some(arrow_of(Some("try again"), Direction::Forward))
        );
        assert_eq!(
            parse_arrow("a*maybe*"),
            Some(arrow_of(Some("maybe"), Direction::Forward))
        );
        assert_eq!(parse_arrow("a"), Some(arrow_of(None, Direction::Forward)));
        assert_eq!(parse_arrow("ab>"), None);
        assert_eq!(parse_arrow(r#"p["x"]"#), None);
    }

    #[test]
    fn test_back_references() {
        assert_eq!(
            parse_back_reference("a>!ts()"),
            Some((arrow_of(None, Direction::Forward), "ts()".to_string()))
        );
        assert_eq!(
            parse_back_reference(r#"a*retry*<!p["Ask"]"#),
            Some((
                arrow_of(Some("retry"), Direction::Backward),
                r#"p["Ask"]"#.to_string()
            ))
        );
        assert_eq!(
            parse_back_reference("a!te()"),
            Some((arrow_of(None, Direction::Forward), "te()".to_string()))
        );
        assert_eq!(parse_back_reference("a>"), None);
        assert_eq!(parse_back_reference("a>!"), None);
    }

    #[test]
    fn test_group_open() {
        assert_eq!(
            parse_group_open("ma>["),
            Some(arrow_of(None, Direction::Forward))
        );
        assert_eq!(
            parse_group_open("ma*Options*>["),
            Some(arrow_of(Some("Options"), Direction::Forward))
        );
        assert_eq!(
            parse_group_open("ma*join<["),
            Some(arrow_of(Some("join"), Direction::Backward))
        );
        // A direction is mandatory for groups
        assert_eq!(parse_group_open("ma["), None);
        assert_eq!(parse_group_open("ma>[ x"), None);
    }
}
