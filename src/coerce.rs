use crate::error::ParseError;
use std::borrow::Cow;
use std::str::FromStr;
use xmltree::Element;

/// Text content of the first child called `name`.
pub fn child_text<'a>(element: &'a Element, name: &str) -> Option<Cow<'a, str>> {
    element.get_child(name).and_then(|child| child.get_text())
}

pub fn attribute<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element.attributes.get(name).map(String::as_str)
}

/// Environment Canada leaves missing readings empty or as a single space.
pub fn text_or_absent(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

pub fn parse_field<T: FromStr>(
    field: &str,
    text: Option<&str>,
) -> Result<Option<T>, ParseError> {
    let Some(text) = text_or_absent(text) else {
        return Ok(None);
    };
    let value = text.trim();
    value
        .parse()
        .map(Some)
        .map_err(|_| ParseError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
}

pub fn parse_text(text: Option<&str>) -> Option<String> {
    text_or_absent(text).map(str::to_string)
}

/// The feed reports wind direction in tens of degrees.
pub fn parse_wind_direction(text: Option<&str>) -> Result<Option<i32>, ParseError> {
    let tens: Option<i32> = parse_field("winddir", text)?;
    Ok(tens.map(|t| t * 10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(text_or_absent(None), None);
        assert_eq!(text_or_absent(Some("")), None);
        assert_eq!(text_or_absent(Some(" ")), None);
        assert_eq!(text_or_absent(Some("\n  \t")), None);
        assert_eq!(text_or_absent(Some("LightRain")), Some("LightRain"));
    }

    #[test]
    fn zero_is_not_absent() {
        let temp: Option<f64> = parse_field("temp", Some("0")).unwrap();
        assert_eq!(temp, Some(0.0));
        let humidity: Option<i32> = parse_field("relhum", Some("0")).unwrap();
        assert_eq!(humidity, Some(0));
    }

    #[test]
    fn numbers_are_trimmed_before_parsing() {
        let temp: Option<f64> = parse_field("temp", Some(" -12.5 ")).unwrap();
        assert_eq!(temp, Some(-12.5));
    }

    #[test]
    fn malformed_number_is_an_error() {
        let result: Result<Option<i32>, _> = parse_field("windspd", Some("calm"));
        match result {
            Err(ParseError::InvalidNumber { field, value }) => {
                assert_eq!(field, "windspd");
                assert_eq!(value, "calm");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn float_text_is_not_an_integer() {
        let result: Result<Option<i32>, _> = parse_field("relhum", Some("55.5"));
        assert!(result.is_err());
    }

    #[test]
    fn wind_direction_is_scaled() {
        assert_eq!(parse_wind_direction(Some("18")).unwrap(), Some(180));
        assert_eq!(parse_wind_direction(Some("0")).unwrap(), Some(0));
        assert_eq!(parse_wind_direction(Some("36")).unwrap(), Some(360));
        assert_eq!(parse_wind_direction(Some(" ")).unwrap(), None);
    }

    #[test]
    fn reads_child_text_and_attributes() {
        let xml = r#"<stationdata hour="3" quality=" ">
            <temp>1.5</temp>
            <weather> </weather>
        </stationdata>"#;
        let element = Element::parse(xml.as_bytes()).unwrap();
        assert_eq!(child_text(&element, "temp").as_deref(), Some("1.5"));
        assert_eq!(text_or_absent(child_text(&element, "weather").as_deref()), None);
        assert_eq!(child_text(&element, "humidex"), None);
        assert_eq!(attribute(&element, "hour"), Some("3"));
        assert_eq!(text_or_absent(attribute(&element, "quality")), None);
        assert_eq!(attribute(&element, "minute"), None);
    }

    #[test]
    fn text_keeps_non_blank_values() {
        assert_eq!(parse_text(Some("Mostly Cloudy")), Some("Mostly Cloudy".into()));
        assert_eq!(parse_text(Some(" ")), None);
    }
}
