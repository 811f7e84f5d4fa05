use crate::error::ParseError;
use crate::observation::{parse_observation, Observation};
use crate::timestamp::standard_offset;
use chrono_tz::Tz;
use xmltree::{Element, XMLNode};

/// One month of hourly data as returned by the bulk data endpoint.
#[derive(Debug)]
pub struct Page {
    /// Every `stationinformation` block, in document order
    pub information: Vec<Element>,
    pub observations: Vec<Observation>,
}

/// Elements called `name` at any depth below `element`, in document order.
fn descendants<'a>(element: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    for child in &element.children {
        if let XMLNode::Element(child) = child {
            if child.name == name {
                found.push(child);
            }
            descendants(child, name, found);
        }
    }
}

pub fn parse_page(xml: &str, station_id: u32, tz: Tz) -> Result<Page, ParseError> {
    let root = Element::parse(xml.as_bytes())?;
    let standard = standard_offset(tz);

    let mut information = Vec::new();
    descendants(&root, "stationinformation", &mut information);
    let mut blocks = Vec::new();
    descendants(&root, "stationdata", &mut blocks);

    let observations = blocks
        .into_iter()
        .map(|block| parse_observation(station_id, block, standard, tz))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        information: information.into_iter().cloned().collect(),
        observations,
    })
}
