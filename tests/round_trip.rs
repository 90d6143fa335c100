//! End-to-end scenarios driven entirely through [`Serializer`], the way a
//! downstream crate would use this one: no direct [`Converter`] construction,
//! only shapes, [`Convert`] impls, and the public serializer surface.

use std::rc::Rc;

use shapepack::config::{DefaultValuePolicy, SerializerOptions};
use shapepack::context::SerializationContext;
use shapepack::converter::{Convert, Converter, ConverterCache, ObjectConverter, UintConverter, UnionConverter};
use shapepack::error::ErrorKind;
use shapepack::shape::{
    HasShape, MemberDescriptor, ObjectModel, PartialObject, Shape, ShapeKind, UnionAlias, UnionEntry, UnionModel,
};
use shapepack::serializer::Serializer;
use shapepack::writer::Writer;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Point {
    x: u32,
    y: u32,
}

impl HasShape for Point {
    fn shape() -> Shape {
        Shape { id: std::any::TypeId::of::<Point>(), name: "Point", kind: ShapeKind::Object }
    }
}

fn write_x(v: &Point, w: &mut Writer<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    UintConverter::<u32>::default().write(w, &v.x, ctx)
}
fn read_x(p: &mut PartialObject<Point>, r: &mut shapepack::reader::Reader<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    p.set(0, UintConverter::<u32>::default().read(r, ctx)?);
    Ok(())
}
fn write_y(v: &Point, w: &mut Writer<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    UintConverter::<u32>::default().write(w, &v.y, ctx)
}
fn read_y(p: &mut PartialObject<Point>, r: &mut shapepack::reader::Reader<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    p.set(1, UintConverter::<u32>::default().read(r, ctx)?);
    Ok(())
}

impl ObjectModel for Point {
    const MEMBERS: &'static [MemberDescriptor<Self>] = &[
        MemberDescriptor {
            name: "x",
            explicit_key: None,
            required: true,
            is_unused_data_sink: false,
            write: write_x,
            read_into: read_x,
            is_default: |v| v.x == 0,
        },
        MemberDescriptor {
            name: "y",
            explicit_key: None,
            required: true,
            is_unused_data_sink: false,
            write: write_y,
            read_into: read_y,
            is_default: |v| v.y == 0,
        },
    ];

    fn build(mut p: PartialObject<Self>) -> Result<Self, shapepack::Error> {
        Ok(Point { x: p.take(0).unwrap(), y: p.take(1).unwrap() })
    }
}

impl Convert for Point {
    fn converter(_cache: &ConverterCache) -> Rc<dyn Converter<Self>> {
        Rc::new(ObjectConverter::<Self>::new())
    }
}

/// Same members as [`Point`] but every member carries an explicit array
/// position, so it round-trips over array layout instead of map layout.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Coord {
    lat: u32,
    lon: u32,
}

impl HasShape for Coord {
    fn shape() -> Shape {
        Shape { id: std::any::TypeId::of::<Coord>(), name: "Coord", kind: ShapeKind::Object }
    }
}

fn write_lat(v: &Coord, w: &mut Writer<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    UintConverter::<u32>::default().write(w, &v.lat, ctx)
}
fn read_lat(p: &mut PartialObject<Coord>, r: &mut shapepack::reader::Reader<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    p.set(0, UintConverter::<u32>::default().read(r, ctx)?);
    Ok(())
}
fn write_lon(v: &Coord, w: &mut Writer<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    UintConverter::<u32>::default().write(w, &v.lon, ctx)
}
fn read_lon(p: &mut PartialObject<Coord>, r: &mut shapepack::reader::Reader<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    p.set(1, UintConverter::<u32>::default().read(r, ctx)?);
    Ok(())
}

impl ObjectModel for Coord {
    const MEMBERS: &'static [MemberDescriptor<Self>] = &[
        MemberDescriptor {
            name: "lat",
            explicit_key: Some(0),
            required: true,
            is_unused_data_sink: false,
            write: write_lat,
            read_into: read_lat,
            is_default: |v| v.lat == 0,
        },
        MemberDescriptor {
            name: "lon",
            explicit_key: Some(1),
            required: true,
            is_unused_data_sink: false,
            write: write_lon,
            read_into: read_lon,
            is_default: |v| v.lon == 0,
        },
    ];

    fn build(mut p: PartialObject<Self>) -> Result<Self, shapepack::Error> {
        Ok(Coord { lat: p.take(0).unwrap(), lon: p.take(1).unwrap() })
    }
}

impl Convert for Coord {
    fn converter(_cache: &ConverterCache) -> Rc<dyn Converter<Self>> {
        Rc::new(ObjectConverter::<Self>::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape2D {
    Circle(u32),
    Square(u32),
}

impl HasShape for Shape2D {
    fn shape() -> Shape {
        Shape { id: std::any::TypeId::of::<Shape2D>(), name: "Shape2D", kind: ShapeKind::Union }
    }
}

fn circle_write(v: &Shape2D, w: &mut Writer<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    let Shape2D::Circle(r) = v else { unreachable!() };
    UintConverter::<u32>::default().write(w, r, ctx)
}
fn circle_read(r: &mut shapepack::reader::Reader<'_>, ctx: &SerializationContext) -> Result<Shape2D, shapepack::Error> {
    Ok(Shape2D::Circle(UintConverter::<u32>::default().read(r, ctx)?))
}
fn square_write(v: &Shape2D, w: &mut Writer<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    let Shape2D::Square(s) = v else { unreachable!() };
    UintConverter::<u32>::default().write(w, s, ctx)
}
fn square_read(r: &mut shapepack::reader::Reader<'_>, ctx: &SerializationContext) -> Result<Shape2D, shapepack::Error> {
    Ok(Shape2D::Square(UintConverter::<u32>::default().read(r, ctx)?))
}

impl UnionModel for Shape2D {
    const ENTRIES: &'static [UnionEntry<Self>] = &[
        UnionEntry {
            alias: None,
            matches: |v| matches!(v, Shape2D::Circle(_)),
            write_inner: circle_write,
            read_inner: circle_read,
        },
        UnionEntry {
            alias: Some(UnionAlias::Text("square")),
            matches: |v| matches!(v, Shape2D::Square(_)),
            write_inner: square_write,
            read_inner: square_read,
        },
    ];
}

impl Convert for Shape2D {
    fn converter(_cache: &ConverterCache) -> Rc<dyn Converter<Self>> {
        Rc::new(UnionConverter::<Self>::new())
    }
}

#[test]
fn object_as_map_round_trips() {
    let serializer = Serializer::new(SerializerOptions::default());
    let value = Point { x: 3, y: 4 };
    let bytes = serializer.serialize(&value).unwrap();
    assert_eq!(serializer.deserialize::<Point>(&bytes).unwrap(), value);
}

#[test]
fn object_as_array_round_trips() {
    let serializer = Serializer::new(SerializerOptions::default());
    let value = Coord { lat: 51, lon: 7 };
    let bytes = serializer.serialize(&value).unwrap();
    // array layout: no member names on the wire, just a 2-element array.
    assert_eq!(bytes[0] & 0xf0, 0x90);
    assert_eq!(serializer.deserialize::<Coord>(&bytes).unwrap(), value);
}

#[test]
fn union_round_trips_both_the_base_entry_and_a_text_alias() {
    let serializer = Serializer::new(SerializerOptions::default());
    for value in [Shape2D::Circle(5), Shape2D::Square(8)] {
        let bytes = serializer.serialize(&value).unwrap();
        assert_eq!(serializer.deserialize::<Shape2D>(&bytes).unwrap(), value);
    }
}

/// Two members that may or may not point at the same [`Point`], used to
/// exercise reference preservation within a single call.
#[derive(Debug)]
struct Pair {
    a: Rc<Point>,
    b: Rc<Point>,
}

impl HasShape for Pair {
    fn shape() -> Shape {
        Shape { id: std::any::TypeId::of::<Pair>(), name: "Pair", kind: ShapeKind::Object }
    }
}

fn write_a(v: &Pair, w: &mut Writer<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    ctx.converters().resolve::<Rc<Point>>().write(w, &v.a, ctx)
}
fn read_a(p: &mut PartialObject<Pair>, r: &mut shapepack::reader::Reader<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    p.set(0, ctx.converters().resolve::<Rc<Point>>().read(r, ctx)?);
    Ok(())
}
fn write_b(v: &Pair, w: &mut Writer<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    ctx.converters().resolve::<Rc<Point>>().write(w, &v.b, ctx)
}
fn read_b(p: &mut PartialObject<Pair>, r: &mut shapepack::reader::Reader<'_>, ctx: &SerializationContext) -> Result<(), shapepack::Error> {
    p.set(1, ctx.converters().resolve::<Rc<Point>>().read(r, ctx)?);
    Ok(())
}

impl ObjectModel for Pair {
    const MEMBERS: &'static [MemberDescriptor<Self>] = &[
        MemberDescriptor {
            name: "a",
            explicit_key: None,
            required: true,
            is_unused_data_sink: false,
            write: write_a,
            read_into: read_a,
            is_default: |_| false,
        },
        MemberDescriptor {
            name: "b",
            explicit_key: None,
            required: true,
            is_unused_data_sink: false,
            write: write_b,
            read_into: read_b,
            is_default: |_| false,
        },
    ];

    fn build(mut p: PartialObject<Self>) -> Result<Self, shapepack::Error> {
        Ok(Pair { a: p.take(0).unwrap(), b: p.take(1).unwrap() })
    }
}

impl Convert for Pair {
    fn converter(_cache: &ConverterCache) -> Rc<dyn Converter<Self>> {
        Rc::new(ObjectConverter::<Self>::new())
    }
}

#[test]
fn reference_preservation_round_trips_shared_identity_within_one_value() {
    let serializer = Serializer::new(SerializerOptions::default().with_preserve_references(true));
    let shared = Rc::new(Point { x: 1, y: 2 });
    let pair = Pair { a: shared.clone(), b: shared.clone() };
    let bytes = serializer.serialize(&pair).unwrap();
    let read_back: Pair = serializer.deserialize(&bytes).unwrap();
    assert!(Rc::ptr_eq(&read_back.a, &read_back.b));
    assert_eq!(*read_back.a, *shared);
}

#[test]
fn without_preserve_references_each_occurrence_is_an_independent_copy() {
    let serializer = Serializer::new(SerializerOptions::default());
    let shared = Rc::new(Point { x: 1, y: 2 });
    let pair = Pair { a: shared.clone(), b: shared.clone() };
    let bytes = serializer.serialize(&pair).unwrap();
    let read_back: Pair = serializer.deserialize(&bytes).unwrap();
    assert!(!Rc::ptr_eq(&read_back.a, &read_back.b));
    assert_eq!(*read_back.a, *read_back.b);
}

#[test]
fn depth_exceeded_is_reported_rather_than_overflowing_the_stack() {
    let serializer = Serializer::new(SerializerOptions::default().with_max_depth(1));
    // a bare scalar fits in one depth step...
    assert!(serializer.serialize(&5u32).is_ok());
    // ...but wrapping it in `Option` needs a second step for the nullable
    // layer itself, which the depth budget of 1 doesn't allow.
    let err = serializer.serialize(&Some(5u32)).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::DepthExceeded { limit: 1 }));
}

#[test]
fn missing_required_member_surfaces_the_member_name() {
    let serializer = Serializer::new(SerializerOptions::default());
    let mut sink = shapepack::io::VecSink::new();
    {
        let mut w = Writer::new(&mut sink);
        w.write_map_header(1);
        w.write_string("x");
        w.write_u32(3);
    }
    let err = serializer.deserialize::<Point>(sink.as_slice()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MissingRequiredMember { name: "y" }));
}

#[test]
fn missing_required_member_error_carries_the_enclosing_member_chain() {
    let serializer = Serializer::new(SerializerOptions::default());
    let mut sink = shapepack::io::VecSink::new();
    {
        let mut w = Writer::new(&mut sink);
        w.write_map_header(1);
        w.write_string("a");
        w.write_map_header(1);
        w.write_string("x");
        w.write_u32(3);
    }
    let err = serializer.deserialize::<Pair>(sink.as_slice()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MissingRequiredMember { name: "y" }));
    assert_eq!(err.to_string(), "a: missing required member \"y\"");
}

#[test]
fn serialize_default_values_policy_controls_whether_defaults_are_emitted() {
    let serializer =
        Serializer::new(SerializerOptions::default().with_serialize_default_values(DefaultValuePolicy::Never));
    let bytes = serializer.serialize(&Point { x: 0, y: 0 }).unwrap();
    // both members are at their default, so the map is empty.
    assert_eq!(bytes, vec![0x80]);
}

#[tokio::test]
async fn streaming_round_trip_across_many_small_poll_reads() {
    use shapepack::async_io::{AsyncReader, AsyncWriter};

    let serializer = Serializer::new(SerializerOptions::default());
    let mut pipe = Vec::new();
    {
        let mut w = AsyncWriter::new(&mut pipe);
        serializer.serialize_async(&mut w, &Point { x: 10, y: 20 }).await.unwrap();
        serializer.serialize_async(&mut w, &Point { x: 30, y: 40 }).await.unwrap();
        w.flush().await.unwrap();
    }

    let mut r = AsyncReader::new(pipe.as_slice()).with_chunk_size(3);
    let first: Point = serializer.deserialize_async(&mut r).await.unwrap();
    let second: Point = serializer.deserialize_async(&mut r).await.unwrap();
    assert_eq!(first, Point { x: 10, y: 20 });
    assert_eq!(second, Point { x: 30, y: 40 });

    let opts = SerializerOptions::default();
    let cache = ConverterCache::new();
    let eof: Option<Point> = r.try_read_value(&SerializationContext::new(&opts, &cache)).await.unwrap();
    assert_eq!(eof, None);
}
