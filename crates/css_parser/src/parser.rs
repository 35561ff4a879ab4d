//! Selector parser.

use crate::selector::{
    AttributeOperator, AttributeSelector, CaseSensitivity, Combinator, CompoundSelector, Selector,
    SelectorList,
};
use common::BridgeError;
use cssparser::{BasicParseErrorKind, ParseError, ParseErrorKind, Parser, ParserInput, Token};
use thiserror::Error;

/// Parse a comma-separated selector list.
pub fn parse_selector_list(css: &str) -> Result<SelectorList, SelectorError> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);

    let selectors = parser
        .parse_entirely(|input| input.parse_comma_separated(parse_selector))
        .map_err(|err| SelectorError::new(css, err))?;

    tracing::trace!(selector = css, count = selectors.len(), "parsed selector list");
    Ok(SelectorList { selectors })
}

/// Error produced when a selector cannot be parsed.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("invalid selector `{selector}` at {line}:{column}: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub line: u32,
    pub column: u32,
    pub reason: String,
}

impl SelectorError {
    fn new(css: &str, err: ParseError<'_, SelectorParseError<'_>>) -> Self {
        let reason = match err.kind {
            ParseErrorKind::Custom(custom) => custom.to_string(),
            ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
                format!("unexpected token {:?}", token)
            }
            ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => "unexpected end of input".into(),
            ParseErrorKind::Basic(other) => format!("{:?}", other),
        };
        Self {
            selector: css.to_string(),
            line: err.location.line + 1,
            column: err.location.column,
            reason,
        }
    }
}

impl From<SelectorError> for BridgeError {
    fn from(err: SelectorError) -> Self {
        BridgeError::selector(err.to_string())
    }
}

/// Custom parse error.
#[derive(Clone, Debug, Error)]
pub enum SelectorParseError<'i> {
    #[error("empty selector")]
    EmptySelector,
    #[error("combinator without a selector on both sides")]
    DanglingCombinator,
    #[error("pseudo-classes and pseudo-elements are not supported (:{0})")]
    UnsupportedPseudo(String),
    #[error("unknown attribute flag `{0}`")]
    InvalidAttributeFlag(cssparser::CowRcStr<'i>),
}

type ParseResult<'i, T> = Result<T, ParseError<'i, SelectorParseError<'i>>>;

/// Parse a single complex selector, up to the next comma.
fn parse_selector<'i, 't>(input: &mut Parser<'i, 't>) -> ParseResult<'i, Selector> {
    input.skip_whitespace();

    let mut selector = Selector::default();
    let mut current = CompoundSelector::default();
    let mut pending: Option<Combinator> = None;

    loop {
        let token = match input.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        let combinator = match token {
            Token::WhiteSpace(_) => Some(Combinator::Descendant),
            Token::Delim('>') => Some(Combinator::Child),
            Token::Delim('+') => Some(Combinator::NextSibling),
            Token::Delim('~') => Some(Combinator::SubsequentSibling),
            _ => None,
        };

        if let Some(combinator) = combinator {
            if !current.is_empty() {
                selector.compounds.push(std::mem::take(&mut current));
            }
            if selector.compounds.is_empty() {
                return Err(input.new_custom_error(SelectorParseError::DanglingCombinator));
            }
            // Whitespace around an explicit combinator does not replace it.
            pending = match (pending, combinator) {
                (Some(existing), Combinator::Descendant) => Some(existing),
                (None | Some(Combinator::Descendant), explicit) => Some(explicit),
                (Some(_), _) => {
                    return Err(input.new_custom_error(SelectorParseError::DanglingCombinator))
                }
            };
            continue;
        }

        // A simple selector: starting a new compound consumes the pending combinator.
        if current.is_empty() {
            if let Some(combinator) = pending.take() {
                selector.combinators.push(combinator);
            }
        }

        match token {
            Token::Ident(ref name) if current.is_empty() => {
                current.tag = Some(name.to_ascii_lowercase());
            }
            Token::Delim('*') if current.is_empty() => {
                current.universal = true;
            }
            Token::IDHash(ref id) => {
                current.id = Some(id.to_string());
            }
            Token::Delim('.') => {
                let class = match input.next_including_whitespace()? {
                    Token::Ident(class) => class.to_string(),
                    other => {
                        let other = other.clone();
                        return Err(input.new_unexpected_token_error(other));
                    }
                };
                current.classes.push(class);
            }
            Token::SquareBracketBlock => {
                let attr = input.parse_nested_block(parse_attribute_selector)?;
                current.attributes.push(attr);
            }
            Token::Colon => {
                let name = input
                    .try_parse(|i| i.expect_ident_cloned())
                    .map(|name| name.to_string())
                    .unwrap_or_default();
                return Err(input.new_custom_error(SelectorParseError::UnsupportedPseudo(name)));
            }
            other => return Err(input.new_unexpected_token_error(other)),
        }
    }

    if !current.is_empty() {
        selector.compounds.push(current);
    }
    if selector.compounds.is_empty() {
        return Err(input.new_custom_error(SelectorParseError::EmptySelector));
    }
    if matches!(pending, Some(c) if c != Combinator::Descendant) {
        return Err(input.new_custom_error(SelectorParseError::DanglingCombinator));
    }

    Ok(selector)
}

/// Parse the inside of `[...]`.
fn parse_attribute_selector<'i, 't>(input: &mut Parser<'i, 't>) -> ParseResult<'i, AttributeSelector> {
    let name = input.expect_ident()?.to_ascii_lowercase();

    let token = match input.next() {
        Ok(token) => token.clone(),
        Err(_) => return Ok(AttributeSelector::exists(&name)),
    };

    let operator = match token {
        Token::Delim('=') => AttributeOperator::Equals,
        Token::IncludeMatch => AttributeOperator::Includes,
        Token::DashMatch => AttributeOperator::DashMatch,
        Token::PrefixMatch => AttributeOperator::Prefix,
        Token::SuffixMatch => AttributeOperator::Suffix,
        Token::SubstringMatch => AttributeOperator::Substring,
        other => return Err(input.new_unexpected_token_error(other)),
    };

    let value = input.expect_ident_or_string()?.to_string();

    let case_sensitivity = match input.try_parse(|i| i.expect_ident_cloned()) {
        Ok(flag) => match flag.as_ref() {
            "i" | "I" => CaseSensitivity::Insensitive,
            "s" | "S" => CaseSensitivity::Sensitive,
            _ => return Err(input.new_custom_error(SelectorParseError::InvalidAttributeFlag(flag))),
        },
        Err(_) => CaseSensitivity::Default,
    };

    Ok(AttributeSelector {
        name,
        operation: Some((operator, value)),
        case_sensitivity,
    })
}
