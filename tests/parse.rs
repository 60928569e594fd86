use exg::{Dfg, Graph, ParseError};

const DFG_TEXT: &str = "p dfg 4 1 1 1000\n\
                        n 1 2.5 0\n\
                        n 2 1.5 0\n\
                        n 3 1.0 1\n\
                        n 4 1.0 0\n\
                        e 1 2\n\
                        e 2 3\n\
                        e 2 4\n";

#[test]
fn dfg_round_trip_without_weights() {
    let dfg = Dfg::parse(DFG_TEXT.as_bytes(), false).unwrap();
    assert_eq!(dfg.num_nodes(), 4);
    // header field 5 is the graph name, field 6 the frequency
    assert_eq!(dfg.name(), "1");
    assert_eq!(dfg.frequency(), 1000);
    // weights ignored without -w
    for u in 0..4 {
        assert_eq!(dfg.weight(u), 1.0);
    }
    assert!(dfg.is_forbidden(2));
    // ids are 1-based in the file, 0-based in memory
    assert_eq!(dfg.out_edges(0).to_vec(), vec![1]);
    let mut outs = dfg.out_edges(1).to_vec();
    outs.sort_unstable();
    assert_eq!(outs, vec![2, 3]);
    // the graph is indexed after parsing
    assert!(dfg.pred(3).contains(0));
    assert!(dfg.succ(0).contains(3));
}

#[test]
fn dfg_weights_are_read_with_flag() {
    let dfg = Dfg::parse(DFG_TEXT.as_bytes(), true).unwrap();
    assert_eq!(dfg.weight(0), 2.5);
    assert_eq!(dfg.weight(1), 1.5);
    assert_eq!(dfg.weight(3), 1.0);
}

#[test]
fn dfg_rejects_malformed_input() {
    // edge before the header
    assert!(matches!(
        Dfg::parse(b"e 1 2\np dfg 2 1 1 0\n".as_slice(), false),
        Err(ParseError::InvalidLine)
    ));
    // unknown keyword
    assert!(matches!(
        Dfg::parse(b"p dfg 2 1 1 0\nx 1 2\n".as_slice(), false),
        Err(ParseError::InvalidLine)
    ));
    // short header
    assert!(matches!(
        Dfg::parse(b"p dfg 2\n".as_slice(), false),
        Err(ParseError::InvalidLine)
    ));
    // node id out of range
    assert!(matches!(
        Dfg::parse(b"p dfg 2 1 1 0\ne 1 3\n".as_slice(), false),
        Err(ParseError::InvalidLine)
    ));
    // forbidden flag out of range
    assert!(matches!(
        Dfg::parse(b"p dfg 2 1 1 0\nn 1 1.0 2\n".as_slice(), false),
        Err(ParseError::InvalidLine)
    ));
    // missing fields on an edge
    assert!(matches!(
        Dfg::parse(b"p dfg 2 1 1 0\ne 1\n".as_slice(), false),
        Err(ParseError::InvalidLine)
    ));
    // empty input has no header
    assert!(matches!(
        Dfg::parse(b"".as_slice(), false),
        Err(ParseError::InvalidLine)
    ));
}

#[test]
fn graph_parse_and_invert() {
    let text = "p edge 4 4\ne 1 2\ne 2 3\ne 3 4\ne 4 1\n";
    let mut graph = Graph::parse(text.as_bytes()).unwrap();
    assert_eq!(graph.num_nodes(), 4);
    assert_eq!(graph.num_edges(), 8);

    // the complement of the 4-cycle is the two diagonals
    graph.invert();
    assert_eq!(graph.num_edges(), 4);
    assert_eq!(graph.edges(0).to_vec(), vec![2]);
    assert_eq!(graph.edges(1).to_vec(), vec![3]);

    graph.invert();
    assert_eq!(graph.num_edges(), 8);
}

#[test]
fn graph_rejects_malformed_input() {
    assert!(matches!(
        Graph::parse(b"e 1 2\n".as_slice()),
        Err(ParseError::InvalidLine)
    ));
    assert!(matches!(
        Graph::parse(b"p edge 2\ne 0 1\n".as_slice()),
        Err(ParseError::InvalidLine)
    ));
}
