use nom::IResult;
use nom::Parser;
use nom::bytes::complete::tag;
use nom::character::complete::{char, u32 as number};
use nom::combinator::opt;
use nom::sequence::preceded;

/// Line ranges from a hunk header `@@ -old[,count] +new[,count] @@`.
///
/// Omitted counts default to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
}

impl HunkHeader {
    /// Parse a hunk header line. Anything after the closing `@@` (usually a
    /// function name) is ignored.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        header(line).ok().map(|(_, header)| header)
    }
}

fn header(input: &str) -> IResult<&str, HunkHeader> {
    (tag("@@ "), range('-'), char(' '), range('+'), tag(" @@"))
        .map(
            |(_, (old_start, old_count), _, (new_start, new_count), _)| HunkHeader {
                old_start,
                old_count,
                new_start,
                new_count,
            },
        )
        .parse(input)
}

/// `-start[,count]` or `+start[,count]`
fn range<'a>(
    sign: char,
) -> impl Parser<&'a str, Output = (u32, u32), Error = nom::error::Error<&'a str>> {
    (
        preceded(char(sign), number),
        opt(preceded(char(','), number)),
    )
        .map(|(start, count)| (start, count.unwrap_or(1)))
}
