//! XMLTV export of programme guide data
//!
//! Converts [`ProgramEntry`] lists into the XMLTV document format read by EPG
//! viewers. Conversion is pure; no portal access happens here.

use chrono_tz::Tz;
use quick_xml::se::Serializer;
use serde::Serialize;

use crate::epg::{local_instant, resolve_timezone};
use crate::error::{Operation, Result, StalkerError};
use crate::portal::StalkerClient;
use crate::types::ProgramEntry;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// XMLTV stamp layout: `YYYYMMDDHHmmss ±HHMM`
const STAMP_FORMAT: &str = "%Y%m%d%H%M%S %z";

/// Root `<tv>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "tv")]
pub struct XmltvDocument {
    #[serde(rename = "channel")]
    pub channels: Vec<XmltvChannel>,
    #[serde(rename = "programme")]
    pub programmes: Vec<XmltvProgramme>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmltvChannel {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "display-name")]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmltvProgramme {
    #[serde(rename = "@start")]
    pub start: String,
    #[serde(rename = "@stop")]
    pub stop: String,
    #[serde(rename = "@channel")]
    pub channel: String,
    pub title: String,
    pub desc: String,
    pub category: String,
}

/// Format a UNIX timestamp as an XMLTV stamp in `tz`.
///
/// # Examples
/// ```
/// use stalker_core::xmltv::format_stamp;
///
/// let stamp = format_stamp(chrono_tz::America::New_York, 1_700_000_000).unwrap();
/// assert_eq!(stamp, "20231114171320 -0500");
/// ```
pub fn format_stamp(tz: Tz, epoch: i64) -> Result<String> {
    Ok(local_instant(tz, epoch, Operation::ConvertXmltv)?
        .format(STAMP_FORMAT)
        .to_string())
}

impl XmltvDocument {
    /// Build a document with one channel and one programme per entry.
    ///
    /// The channel's id and display name are both `channel_id`; no
    /// human-readable name is known at this point. Programmes keep input
    /// order and overlapping entries are not merged.
    ///
    /// # Errors
    /// `StalkerError::Timezone` if `timezone` cannot be resolved.
    pub fn from_programs(channel_id: &str, programs: &[ProgramEntry], timezone: &str) -> Result<Self> {
        let tz = resolve_timezone(timezone)?;

        let programmes = programs
            .iter()
            .map(|program| {
                Ok(XmltvProgramme {
                    start: format_stamp(tz, program.start)?,
                    stop: format_stamp(tz, program.stop)?,
                    channel: program.channel_id.clone(),
                    title: program.title.clone(),
                    desc: program.description.clone(),
                    category: program.category.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            channels: vec![XmltvChannel {
                id: channel_id.to_string(),
                display_name: channel_id.to_string(),
            }],
            programmes,
        })
    }

    /// Render as an indented UTF-8 XML document
    pub fn to_xml_string(&self) -> Result<String> {
        let mut xml = String::from(XML_DECLARATION);
        let mut serializer = Serializer::new(&mut xml);
        serializer.indent(' ', 2);
        self.serialize(serializer)
            .map_err(|e| StalkerError::decode(Operation::ConvertXmltv, e.to_string()))?;
        Ok(xml)
    }
}

impl StalkerClient {
    /// Convert programmes to an XMLTV document in the configured timezone
    pub fn to_xmltv(&self, channel_id: &str, programs: &[ProgramEntry]) -> Result<String> {
        XmltvDocument::from_programs(channel_id, programs, &self.config.timezone)?.to_xml_string()
    }
}
