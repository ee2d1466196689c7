use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use photo_engine::format::{Capabilities, FormatGeneration, FormatRequest, ReadRegion};
use photo_engine::{
    Coords, ErrorCode, FormatRegistry, Metadata, OptionSet, PhotoBlock, PhotoError, PhotoFormat,
    PhotoModel, PhotoOptions, PhotoSession, Rect, Rgba, SubcommandOptions,
};
use std::fs::File;
use std::path::Path;
use tempfile::tempdir;

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 40) as u8, (y * 50) as u8, ((x + y) * 10) as u8])
    })
}

fn write_ppm(path: &Path, img: &RgbImage) {
    let file = File::create(path).expect("Failed to create ppm file");
    PnmEncoder::new(file)
        .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .expect("Failed to encode ppm");
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

#[test]
fn configure_file_decodes_ppm() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("gradient.ppm");
    let img = gradient(5, 4);
    write_ppm(&path, &img);

    let mut session = PhotoSession::new();
    let model = session
        .create("g", &PhotoOptions::new().with_file(path_str(&path)))
        .expect("Failed to create image from file");
    assert_eq!(model.dimensions(), (5, 4));
    for (x, y, p) in img.enumerate_pixels() {
        assert_eq!(model.get_pixel(x, y).unwrap(), Rgba::opaque(p[0], p[1], p[2]));
    }
    assert_eq!(model.cget("-file").unwrap(), path_str(&path));
    assert!(model.is_color());
    assert!(!model.has_complex_alpha());
}

#[test]
fn written_ppm_is_readable_by_other_decoders() {
    let dir = tempdir().expect("Failed to create temp dir");
    let source = dir.path().join("in.ppm");
    let target = dir.path().join("out.ppm");
    let img = gradient(6, 3);
    write_ppm(&source, &img);

    let registry = FormatRegistry::with_builtin();
    let mut model = PhotoModel::new();
    model
        .read_file(&registry, path_str(&source), &SubcommandOptions::new())
        .expect("Failed to read ppm");
    model
        .write_file(&registry, path_str(&target), &SubcommandOptions::new())
        .expect("Failed to write ppm");

    let decoded = image::open(&target).expect("image crate could not decode output").to_rgb8();
    assert_eq!(decoded, img);
}

#[test]
fn gray_images_are_written_as_pgm() {
    let dir = tempdir().expect("Failed to create temp dir");
    let target = dir.path().join("gray.ppm");
    let registry = FormatRegistry::with_builtin();
    let mut model = PhotoModel::new();
    model
        .put_block(
            &PhotoBlock::gray(vec![0, 100, 200, 255], 2, 2),
            0,
            0,
            2,
            2,
            photo_engine::CompositingRule::Set,
        )
        .unwrap();
    model
        .write_file(&registry, path_str(&target), &SubcommandOptions::new())
        .unwrap();

    let bytes = std::fs::read(&target).unwrap();
    assert!(bytes.starts_with(b"P5"));
    let decoded = image::open(&target).unwrap().to_luma8();
    assert_eq!(decoded.as_raw(), &[0, 100, 200, 255]);
}

#[test]
fn read_with_from_to_and_shrink() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("g.ppm");
    let img = gradient(5, 5);
    write_ppm(&path, &img);

    let registry = FormatRegistry::with_builtin();
    let mut model = PhotoModel::new();
    model.set_size(8, 8).unwrap();
    let opts = SubcommandOptions::parse(
        &["-from", "1", "2", "3", "4", "-to", "4", "1", "-shrink"],
        OptionSet::READ,
    )
    .unwrap();
    model.read_file(&registry, path_str(&path), &opts).unwrap();

    assert_eq!(model.dimensions(), (6, 3));
    let p = img.get_pixel(2, 3);
    assert_eq!(model.get_pixel(5, 2).unwrap(), Rgba::opaque(p[0], p[1], p[2]));
    assert_eq!(model.get_pixel(0, 0).unwrap(), Rgba::new(0, 0, 0, 0));

    let err = model
        .read_file(
            &registry,
            path_str(&path),
            &SubcommandOptions::new().with_from(Coords::Area(Rect::new(3, 3, 4, 1))),
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadFrom);
}

#[test]
fn truncated_read_leaves_the_image_unchanged() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("short.ppm");
    std::fs::write(&path, b"P6\n50 40\n255\n\x01\x02\x03").expect("Failed to write ppm file");

    let registry = FormatRegistry::with_builtin();
    let mut model = PhotoModel::new();
    model
        .put_block(
            &PhotoBlock::rgb((1..=12).collect::<Vec<u8>>(), 2, 2),
            0,
            0,
            2,
            2,
            photo_engine::CompositingRule::Set,
        )
        .unwrap();
    let before = model.pixels().as_bytes().to_vec();

    for opts in [SubcommandOptions::new(), SubcommandOptions::new().with_shrink()] {
        assert!(model.read_file(&registry, path_str(&path), &opts).is_err());
        assert_eq!(model.dimensions(), (2, 2));
        assert_eq!(model.pixels().as_bytes(), &before[..]);
    }
}

#[test]
fn format_errors_are_distinguished() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("g.ppm");
    write_ppm(&path, &gradient(2, 2));
    let junk = dir.path().join("junk.bin");
    std::fs::write(&junk, b"nothing to see").unwrap();

    let mut session = PhotoSession::new();
    session.registry_mut().register(Box::new(Tagged));

    let unknown = session
        .create("a", &PhotoOptions::new().with_file(path_str(&path)).with_format("gif"))
        .unwrap_err();
    assert_eq!(unknown.code(), ErrorCode::PhotoFormat);

    let unsupported = session
        .create("a", &PhotoOptions::new().with_file(path_str(&path)).with_format("tagged"))
        .unwrap_err();
    assert_eq!(unsupported.code(), ErrorCode::NotFileFormat);

    let unrecognized = session
        .create("a", &PhotoOptions::new().with_file(path_str(&junk)))
        .unwrap_err();
    assert_eq!(unrecognized.code(), ErrorCode::UnrecognizedData);

    let missing = session
        .create("a", &PhotoOptions::new().with_file(path_str(&dir.path().join("none.ppm"))))
        .unwrap_err();
    assert!(matches!(missing, PhotoError::Io(_)));
}

/// String-only test format: data `TAG:<r>,<g>,<b>` is a 1x1 image.
struct Tagged;

fn parse_tag(data: &[u8]) -> Option<[u8; 3]> {
    let text = std::str::from_utf8(data).ok()?.strip_prefix("TAG:")?;
    let mut parts = text.split(',').map(|p| p.trim().parse::<u8>().ok());
    Some([parts.next()??, parts.next()??, parts.next()??])
}

impl PhotoFormat for Tagged {
    fn name(&self) -> &str {
        "tagged"
    }

    fn generation(&self) -> FormatGeneration {
        FormatGeneration::Metadata
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::STRING
    }

    fn string_match(
        &self,
        data: &[u8],
        _request: &FormatRequest<'_>,
        metadata_out: &mut Metadata,
    ) -> photo_engine::Result<Option<(u32, u32)>> {
        Ok(parse_tag(data).map(|_| {
            metadata_out.insert("probed".into(), "yes".into());
            (1, 1)
        }))
    }

    fn string_read(
        &self,
        data: &[u8],
        request: &FormatRequest<'_>,
        image: &mut PhotoModel,
        region: ReadRegion,
        metadata_out: &mut Metadata,
    ) -> photo_engine::Result<()> {
        let rgb = parse_tag(data).ok_or(PhotoError::UnrecognizedData("tag".into()))?;
        if request.metadata.is_some_and(|m| m.contains_key("keep")) {
            metadata_out.insert("saw".into(), "keep".into());
        }
        metadata_out.insert("comment".into(), "from codec".into());
        image.put_block(
            &PhotoBlock::rgb(rgb.to_vec(), 1, 1),
            region.dest_x,
            region.dest_y,
            1,
            1,
            photo_engine::CompositingRule::Set,
        )
    }

    fn string_write(
        &self,
        _request: &FormatRequest<'_>,
        block: &PhotoBlock<'_>,
    ) -> photo_engine::Result<Vec<u8>> {
        let [r, g, b, _] = block.rgba_at(0, 0);
        Ok(format!("TAG:{},{},{}", r, g, b).into_bytes())
    }
}

#[test]
fn codec_metadata_is_merged() {
    let mut session = PhotoSession::new();
    session.registry_mut().register(Box::new(Tagged));

    let mut meta = Metadata::new();
    meta.insert("comment".into(), "mine".into());
    meta.insert("keep".into(), "1".into());
    let model = session
        .create("t", &PhotoOptions::new().with_data("TAG:1,2,3").with_metadata(meta))
        .expect("Failed to decode tagged data");

    assert_eq!(model.get_pixel(0, 0).unwrap(), Rgba::opaque(1, 2, 3));
    let got = model.metadata();
    assert_eq!(got.get("comment").map(String::as_str), Some("from codec"));
    assert_eq!(got.get("keep").map(String::as_str), Some("1"));
    assert_eq!(got.get("probed").map(String::as_str), Some("yes"));
    assert_eq!(got.get("saw").map(String::as_str), Some("keep"));
}

#[test]
fn string_formats_by_name() {
    let mut session = PhotoSession::new();
    session.registry_mut().register(Box::new(Tagged));
    session
        .create("t", &PhotoOptions::new().with_data("{#0a0b0c}"))
        .unwrap();

    let (registry, model) = session.parts_mut("t").unwrap();
    let opts = SubcommandOptions::parse(&["-format", "tagged"], OptionSet::DATA).unwrap();
    assert_eq!(model.encode_data(registry, &opts).unwrap(), b"TAG:10,11,12");

    let opts = SubcommandOptions::parse(&["-format", "png"], OptionSet::DATA).unwrap();
    assert_eq!(
        model.encode_data(registry, &opts).unwrap_err().code(),
        ErrorCode::PhotoFormat
    );

    let opts = SubcommandOptions::parse(&["-to", "1", "0"], OptionSet::PUT).unwrap();
    model.put_data(registry, b"TAG:7,8,9", &opts).unwrap();
    assert_eq!(model.dimensions(), (2, 1));
    assert_eq!(model.get_pixel(1, 0).unwrap(), Rgba::opaque(7, 8, 9));
}

#[test]
fn ppm_strings_round_trip() {
    let registry = FormatRegistry::with_builtin();
    let mut model = PhotoModel::new();
    model
        .put_data(&registry, b"{red green} {blue white}", &SubcommandOptions::new())
        .unwrap();
    let opts = SubcommandOptions::parse(&["-format", "ppm"], OptionSet::DATA).unwrap();
    let ppm = model.encode_data(&registry, &opts).unwrap();
    assert!(ppm.starts_with(b"P6"));

    let mut copy = PhotoModel::new();
    copy.put_data(&registry, &ppm, &SubcommandOptions::new()).unwrap();
    assert_eq!(copy.pixels().as_bytes(), model.pixels().as_bytes());
}
