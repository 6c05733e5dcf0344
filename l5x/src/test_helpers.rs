use quicksfc_dsl::{core::FileId, graph::Sfc};
use quicksfc_parser::{options::ParseOptions, parse_program};
use quicksfc_test::read_shared_resource;

pub fn parse(source: &str) -> Sfc {
    parse_program(source, &FileId::new(), &ParseOptions::default()).unwrap()
}

pub fn parse_resource(name: &'static str) -> Sfc {
    parse(&read_shared_resource(name))
}
