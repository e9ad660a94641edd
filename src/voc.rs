//! Typed view of a VOC detection record.

use crate::bbox::CornerBox;
use crate::error::{Error, Result};
use crate::record::{AnnotationTree, Node, Record};

pub const DEFAULT_POSE: &str = "Unspecified";
pub const DEFAULT_DEPTH: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct VocObject {
    pub name: String,
    pub pose: String,
    pub truncated: u32,
    pub difficult: u32,
    pub bndbox: CornerBox,
}

impl VocObject {
    pub fn is_difficult(&self) -> bool {
        self.difficult != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VocAnnotation {
    pub folder: Option<String>,
    pub filename: Option<String>,
    pub path: Option<String>,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub objects: Vec<VocObject>,
}

fn required<'a>(record: &'a Record, path: &str, field: &str) -> Result<&'a str> {
    record
        .lookup(path)
        .and_then(Record::text)
        .ok_or_else(|| Error::missing_field(field))
}

fn optional(record: &Record, path: &str) -> Option<String> {
    record
        .lookup(path)
        .and_then(Record::text)
        .map(str::to_string)
}

fn parse_number<T: std::str::FromStr>(text: &str, field: &str) -> Result<T> {
    text.trim().parse().map_err(|_| Error::InvalidField {
        field: field.to_string(),
        value: text.to_string(),
    })
}

/// Flags are usually `0`/`1` but some tools write them as floats.
fn parse_flag(text: &str, field: &str) -> Result<u32> {
    let value: f64 = parse_number(text, field)?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(Error::InvalidField {
            field: field.to_string(),
            value: text.to_string(),
        });
    }
    Ok(value as u32)
}

fn parse_size(body: &Record, tag: &str) -> Result<u32> {
    let field = format!("size.{}", tag);
    let text = required(body, &field, &field)?;
    // Some exporters write sizes like "500.0".
    let value: f64 = parse_number(text, &field)?;
    if value <= 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(Error::InvalidField {
            field,
            value: text.to_string(),
        });
    }
    Ok(value as u32)
}

impl VocObject {
    fn from_record(record: &Record, index: usize) -> Result<Self> {
        let prefix = format!("object[{}]", index);
        let name = required(record, "name", &format!("{}.name", prefix))?.to_string();

        let difficult = match record.get("difficult").and_then(Record::text) {
            Some(text) if !text.is_empty() => parse_flag(text, &format!("{}.difficult", prefix))?,
            _ => 0,
        };
        let truncated = match record.get("truncated").and_then(Record::text) {
            Some(text) if !text.is_empty() => parse_flag(text, &format!("{}.truncated", prefix))?,
            _ => 0,
        };
        let pose = optional(record, "pose")
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_POSE.to_string());

        let coord = |tag: &str| -> Result<f64> {
            let field = format!("{}.bndbox.{}", prefix, tag);
            let text = required(record, &format!("bndbox.{}", tag), &field)?;
            parse_number(text, &field)
        };
        let bndbox = CornerBox::new(coord("xmin")?, coord("ymin")?, coord("xmax")?, coord("ymax")?);

        Ok(Self {
            name,
            pose,
            truncated,
            difficult,
            bndbox,
        })
    }

    fn to_record(&self) -> Record {
        let mut bndbox = Node::new();
        for (tag, value) in [
            ("xmin", self.bndbox.xmin),
            ("ymin", self.bndbox.ymin),
            ("xmax", self.bndbox.xmax),
            ("ymax", self.bndbox.ymax),
        ] {
            bndbox.set(tag, Record::leaf(format_coord(value)));
        }

        let mut node = Node::new();
        node.set("name", Record::leaf(&self.name));
        node.set("pose", Record::leaf(&self.pose));
        node.set("truncated", Record::leaf(self.truncated.to_string()));
        node.set("difficult", Record::leaf(self.difficult.to_string()));
        node.set("bndbox", bndbox.into());
        node.into()
    }
}

/// Integral coordinates are written without a decimal point.
fn format_coord(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl VocAnnotation {
    /// Extract the typed record, failing on the first missing required field.
    pub fn from_tree(tree: &AnnotationTree) -> Result<Self> {
        if tree.tag != "annotation" {
            return Err(Error::missing_field("annotation"));
        }
        let body = &tree.body;
        let width = parse_size(body, "width")?;
        let height = parse_size(body, "height")?;
        let depth = match body.lookup("size.depth").and_then(Record::text) {
            Some(text) if !text.is_empty() => parse_number(text, "size.depth")?,
            _ => DEFAULT_DEPTH,
        };

        let objects = body
            .get_all("object")
            .iter()
            .enumerate()
            .map(|(index, record)| VocObject::from_record(record, index))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            folder: optional(body, "folder"),
            filename: optional(body, "filename"),
            path: optional(body, "path"),
            width,
            height,
            depth,
            objects,
        })
    }

    /// Build the tree written for a converted record.
    pub fn to_tree(&self) -> AnnotationTree {
        let mut source = Node::new();
        source.set("database", Record::leaf("Unknown"));

        let mut size = Node::new();
        size.set("width", Record::leaf(self.width.to_string()));
        size.set("height", Record::leaf(self.height.to_string()));
        size.set("depth", Record::leaf(self.depth.to_string()));

        let mut body = Node::new();
        body.set("folder", Record::leaf(self.folder.clone().unwrap_or_default()));
        body.set("filename", Record::leaf(self.filename.clone().unwrap_or_default()));
        body.set("path", Record::leaf(self.path.clone().unwrap_or_default()));
        body.set("source", source.into());
        body.set("size", size.into());
        body.set("segmented", Record::leaf("0"));
        body.set_all(
            "object",
            self.objects.iter().map(VocObject::to_record).collect(),
        );

        AnnotationTree {
            tag: "annotation".to_string(),
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{parse_xml, render_xml};

    fn annotation(objects: &str) -> String {
        format!(
            "<annotation><filename>a.jpg</filename><size><width>500</width><height>375</height></size>{}</annotation>",
            objects
        )
    }

    #[test]
    fn test_from_tree() {
        let xml = annotation(
            "<object><name>person</name><difficult>1</difficult>\
             <bndbox><xmin>100</xmin><ymin>50.5</ymin><xmax>300</xmax><ymax>200</ymax></bndbox></object>",
        );
        let voc = VocAnnotation::from_tree(&parse_xml(&xml).unwrap()).unwrap();
        assert_eq!((voc.width, voc.height, voc.depth), (500, 375, 3));
        assert_eq!(voc.filename.as_deref(), Some("a.jpg"));
        assert_eq!(voc.objects.len(), 1);
        let object = &voc.objects[0];
        assert!(object.is_difficult());
        assert_eq!(object.pose, DEFAULT_POSE);
        assert_eq!(object.bndbox, CornerBox::new(100.0, 50.5, 300.0, 200.0));
    }

    #[test]
    fn test_missing_fields_reported_at_conversion() {
        let tree = parse_xml("<annotation><size><width>10</width></size></annotation>").unwrap();
        assert!(matches!(
            VocAnnotation::from_tree(&tree),
            Err(Error::MissingField { ref field }) if field == "size.height"
        ));

        let xml = annotation(
            "<object><name>a</name><bndbox><xmin>1</xmin><ymin>1</ymin><xmax>2</xmax><ymax>2</ymax></bndbox></object>\
             <object><name>b</name><bndbox><xmin>1</xmin><ymin>1</ymin><xmax>2</xmax></bndbox></object>",
        );
        let tree = parse_xml(&xml).unwrap();
        assert!(matches!(
            VocAnnotation::from_tree(&tree),
            Err(Error::MissingField { ref field }) if field == "object[1].bndbox.ymax"
        ));
    }

    #[test]
    fn test_difficult_defaults_to_zero() {
        let xml = annotation(
            "<object><name>a</name><bndbox><xmin>1</xmin><ymin>1</ymin><xmax>2</xmax><ymax>2</ymax></bndbox></object>",
        );
        let voc = VocAnnotation::from_tree(&parse_xml(&xml).unwrap()).unwrap();
        assert_eq!(voc.objects[0].difficult, 0);
    }

    #[test]
    fn test_invalid_size() {
        let tree =
            parse_xml("<annotation><size><width>0</width><height>3</height></size></annotation>")
                .unwrap();
        assert!(matches!(
            VocAnnotation::from_tree(&tree),
            Err(Error::InvalidField { .. })
        ));
    }

    #[test]
    fn test_to_tree_round_trip() {
        let voc = VocAnnotation {
            folder: Some("out".to_string()),
            filename: Some("a.jpg".to_string()),
            path: Some("/data/a.jpg".to_string()),
            width: 640,
            height: 480,
            depth: 3,
            objects: vec![VocObject {
                name: "dog".to_string(),
                pose: DEFAULT_POSE.to_string(),
                truncated: 0,
                difficult: 0,
                bndbox: CornerBox::new(1.0, 2.0, 30.0, 40.0),
            }],
        };
        let xml = render_xml(&voc.to_tree()).unwrap();
        assert!(xml.contains("<xmin>1</xmin>"));
        let back = VocAnnotation::from_tree(&parse_xml(&xml).unwrap()).unwrap();
        assert_eq!(back, voc);
    }
}
