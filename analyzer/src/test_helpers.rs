use quicksfc_dsl::{core::FileId, graph::Sfc};
use quicksfc_parser::{options::ParseOptions, parse_program};
use quicksfc_test::read_shared_resource;

use crate::{synthesize, Topology};

pub fn parse(source: &str) -> Sfc {
    parse_program(source, &FileId::new(), &ParseOptions::default()).unwrap()
}

pub fn parse_resource(name: &'static str) -> Sfc {
    parse(&read_shared_resource(name))
}

pub fn synthesize_resource(name: &'static str) -> (Sfc, Topology) {
    let sfc = parse_resource(name);
    let topology = synthesize(&sfc).unwrap();
    (sfc, topology)
}
