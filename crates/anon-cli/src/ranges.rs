//! Job id arguments: single ids or inclusive ranges like `5-15`.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("'{input}' is not a job id or a range like 5-15")]
    Invalid { input: String },

    #[error("range '{input}' starts after it ends")]
    Reversed { input: String },
}

/// Ids given as one command line argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobIdRange(pub Vec<u64>);

impl FromStr for JobIdRange {
    type Err = RangeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || RangeError::Invalid {
            input: input.to_string(),
        };
        let parse = |value: &str| value.trim().parse::<u64>().map_err(|_| invalid());

        match input.split_once('-') {
            None => Ok(Self(vec![parse(input)?])),
            Some((start, end)) => {
                let (start, end) = (parse(start)?, parse(end)?);
                if start > end {
                    return Err(RangeError::Reversed {
                        input: input.to_string(),
                    });
                }
                Ok(Self((start..=end).collect()))
            }
        }
    }
}

/// All ids in the given ranges, in argument order.
pub fn flatten(ranges: &[JobIdRange]) -> Vec<u64> {
    ranges.iter().flat_map(|range| range.0.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ranges() {
        assert_eq!("7".parse::<JobIdRange>().unwrap().0, vec![7]);
        assert_eq!("5-8".parse::<JobIdRange>().unwrap().0, vec![5, 6, 7, 8]);
        assert_eq!("3-3".parse::<JobIdRange>().unwrap().0, vec![3]);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(matches!("8-5".parse::<JobIdRange>(), Err(RangeError::Reversed { .. })));
        assert!(matches!("a-5".parse::<JobIdRange>(), Err(RangeError::Invalid { .. })));
        assert!(matches!("-5".parse::<JobIdRange>(), Err(RangeError::Invalid { .. })));
        assert!("1-2-3".parse::<JobIdRange>().is_err());
    }

    #[test]
    fn test_flatten() {
        let ranges = vec![JobIdRange(vec![1, 2]), JobIdRange(vec![10])];
        assert_eq!(flatten(&ranges), vec![1, 2, 10]);
    }
}
