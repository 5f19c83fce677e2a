use nom::branch::alt;
use nom::bytes::complete::tag_no_case;
use nom::character::complete::{alpha1, multispace0, multispace1};
use nom::combinator::{eof, map_res, opt, rest, value, verify};
use nom::sequence::{pair, preceded, terminated, tuple};
use nom::IResult;

use crate::common::Error;
use crate::entry::Field;

/// Which table an export writes out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExportScope {
    All,
    Filtered,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    /// ADD date - flat - item - amount, or just the entry text
    Add(String),
    /// VOICE
    Voice,
    /// EDIT id field value
    Edit(u32, Field, String),
    /// DELETE id
    Delete(u32),
    /// FILTER token
    Filter(String),
    /// CLEAR
    ClearFilter,
    /// SHOW
    Show,
    /// EXPORT [FILTERED] [TO file_path]
    Export(ExportScope, Option<String>),
    Help,
    Quit,
}

pub(crate) const USAGE: &str = "\
Commands:
  date - flat - item - amount     add an entry (ADD is optional)
  VOICE                           add an entry by speech
  EDIT <id> <field> <value>       change date, flat, item or amount of an entry
  DELETE <id>                     remove an entry
  FILTER <flat>                   show entries whose flat contains <flat>
  CLEAR                           remove the filter
  SHOW                            print tables and totals
  EXPORT [FILTERED] [TO <file>]   write a table to a CSV file
  HELP, QUIT";

pub(crate) fn parse(input: &str) -> Result<Command, Error> {
    let input = input.trim();
    let result = alt((add, voice, edit, delete, filter, clear, show, export, help, quit, bare_entry))(input);
    match result {
        Ok((_, command)) => Ok(command),
        Err(_) => Err(Error::new(format!("Unrecognised command '{input}'. Type HELP for usage."))),
    }
}

/// A keyword with nothing after it
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag_no_case(word), pair(multispace0, eof))
}

fn add(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_no_case("ADD")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, text) = rest(input)?;
    Ok((input, Command::Add(text.trim().to_string())))
}

/// Anything that looks like an entry is added without a keyword
fn bare_entry(input: &str) -> IResult<&str, Command> {
    if input.contains('-') {
        Ok(("", Command::Add(input.to_string())))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Verify)))
    }
}

fn voice(input: &str) -> IResult<&str, Command> {
    value(Command::Voice, keyword("VOICE"))(input)
}

fn edit(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_no_case("EDIT")(input)?;
    let (input, id) = preceded(multispace1, nom::character::complete::u32)(input)?;
    let (input, field) = preceded(multispace1, map_res(alpha1, |name: &str| Field::try_from(name)))(input)?;
    let (input, new_value) = alt((eof, preceded(multispace1, rest)))(input)?;
    Ok((input, Command::Edit(id, field, new_value.trim().to_string())))
}

fn delete(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_no_case("DELETE")(input)?;
    let (input, id) = preceded(multispace1, nom::character::complete::u32)(input)?;
    let (input, _) = pair(multispace0, eof)(input)?;
    Ok((input, Command::Delete(id)))
}

/// Parse `FILTER token`. A token starting with `-` means the line is an entry whose date is "Filter".
fn filter(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_no_case("FILTER")(input)?;
    let (input, token) = alt((eof, preceded(multispace1, verify(rest, |t: &str| !t.starts_with('-')))))(input)?;
    Ok((input, Command::Filter(token.trim().to_string())))
}

fn clear(input: &str) -> IResult<&str, Command> {
    value(Command::ClearFilter, keyword("CLEAR"))(input)
}

fn show(input: &str) -> IResult<&str, Command> {
    value(Command::Show, keyword("SHOW"))(input)
}

fn help(input: &str) -> IResult<&str, Command> {
    value(Command::Help, keyword("HELP"))(input)
}

fn quit(input: &str) -> IResult<&str, Command> {
    value(Command::Quit, alt((keyword("QUIT"), keyword("EXIT"))))(input)
}

/// Parse `EXPORT [FILTERED] [TO file_path]`
fn export(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_no_case("EXPORT")(input)?;
    let (input, filtered) = opt(preceded(multispace1, tag_no_case("FILTERED")))(input)?;
    let (input, file_path) = opt(preceded(tuple((multispace1, tag_no_case("TO"), multispace1)), rest))(input)?;
    let (input, _) = pair(multispace0, eof)(input)?;

    let scope = match filtered {
        Some(_) => ExportScope::Filtered,
        None => ExportScope::All,
    };
    let quotation_marks: &[_] = &['\'', '"'];
    let file_path = file_path
        .map(|p| p.trim().trim_matches(quotation_marks).to_string())
        .filter(|p| !p.is_empty());
    Ok((input, Command::Export(scope, file_path)))
}
