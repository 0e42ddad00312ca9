use gexf_query_core::{
    centrality, components, neighbors, reachable, shortest_path, stats, CentralityKind,
    CentralityOptions, ComponentKind, EdgeRecord, GraphModel, NodeRecord, Reach,
    TraversalDirection,
};
use std::collections::VecDeque;
use std::time::Instant;

/// Above this size the O(VE) measures (betweenness, closeness, stats) are skipped.
const QUADRATIC_LIMIT: usize = 5_000;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mode = args.get(1).map(|s| s.as_str()).unwrap_or("all");
    let node_count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(50_000);

    if mode == "help" || mode == "--help" {
        println!("Usage: gexf-query-bench [mode] [node_count]");
        println!();
        println!("Modes:");
        println!("  all         Run every topology (default)");
        println!("  tree        Ternary tree (deep paths, no cycles)");
        println!("  scalefree   Preferential attachment (hub-and-spoke)");
        println!("  smallworld  Ring lattice with random shortcuts");
        println!("  barbell     Two dense clusters joined by a thin bridge");
        println!("  dla         Frontier growth with occasional loops");
        println!();
        println!("Default node_count: 50000");
        println!("Betweenness, closeness and stats run only up to {} nodes.", QUADRATIC_LIMIT);
        return;
    }

    println!("gexf-query-bench");
    println!("================");
    println!();

    let topologies: Vec<(&str, fn(u64) -> GraphModel)> = match mode {
        "tree" => vec![("Ternary tree", gen_tree)],
        "scalefree" => vec![("Scale-free", gen_scale_free)],
        "smallworld" => vec![("Small-world", gen_small_world)],
        "barbell" => vec![("Barbell", gen_barbell)],
        "dla" => vec![("DLA growth", gen_dla)],
        "all" => vec![
            ("Ternary tree", gen_tree as fn(u64) -> GraphModel),
            ("Scale-free", gen_scale_free),
            ("Small-world", gen_small_world),
            ("Barbell", gen_barbell),
            ("DLA growth", gen_dla),
        ],
        _ => {
            eprintln!("Unknown mode: {}. Use --help for options.", mode);
            return;
        }
    };

    for (name, generator) in topologies {
        run_benchmark(name, generator, node_count);
    }
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let t = Instant::now();
    let out = f();
    (out, t.elapsed().as_secs_f64() * 1000.0)
}

fn run_benchmark(name: &str, generator: fn(u64) -> GraphModel, node_count: u64) {
    println!("--- {} ---", name);
    println!("Target: {} nodes", node_count);

    let (graph, gen_ms) = timed(|| generator(node_count));
    println!(
        "Built in {:.1}ms: {} nodes, {} edges, ~{:.1}MB",
        gen_ms,
        graph.node_count(),
        graph.edge_count(),
        graph.memory_usage() as f64 / 1_048_576.0
    );
    if graph.node_count() == 0 {
        println!();
        return;
    }

    let origin = node_id(0);
    let far = node_id(graph.node_count() as u64 - 1);

    println!();
    println!("{:>8} {:>12} {:>10}", "depth", "found", "time");
    println!("{:->8} {:->12} {:->10}", "", "", "");
    for depth in [1, 2, 3, 5, 10] {
        let (found, ms) = timed(|| neighbors(&graph, &origin, TraversalDirection::Both, depth));
        let count = found.map(|f| f.len()).unwrap_or(0);
        println!("{:>8} {:>12} {:>8.1}ms", depth, count, ms);
        if count + 1 >= graph.node_count() {
            println!("{:>8} (entire graph reached)", "");
            break;
        }
    }

    println!();
    let (desc, ms) = timed(|| reachable(&graph, &origin, Reach::Forward, None));
    report("reachable (forward)", desc.map(|d| d.len()).ok(), ms);

    let (path, ms) = timed(|| shortest_path(&graph, &origin, &far, false));
    report("shortest path (hops)", path.ok().flatten().map(|p| p.length), ms);

    let (path, ms) = timed(|| shortest_path(&graph, &origin, &far, true));
    match path {
        Ok(Some(p)) => println!(
            "{:<28} {} hops, weight {:.2} in {:.1}ms",
            "shortest path (weighted)",
            p.length,
            p.total_weight.unwrap_or(0.0),
            ms
        ),
        Ok(None) => println!("{:<28} no path ({:.1}ms)", "shortest path (weighted)", ms),
        Err(e) => println!("{:<28} {}", "shortest path (weighted)", e),
    }

    let (weak, ms) = timed(|| components(&graph, ComponentKind::Weakly));
    report("weak components", Some(weak.num_components), ms);
    let (strong, ms) = timed(|| components(&graph, ComponentKind::Strongly));
    report("strong components", Some(strong.num_components), ms);

    let options = CentralityOptions::default();
    let mut kinds = vec![CentralityKind::Degree, CentralityKind::PageRank, CentralityKind::Eigenvector];
    if graph.node_count() <= QUADRATIC_LIMIT {
        kinds.push(CentralityKind::Betweenness);
        kinds.push(CentralityKind::Closeness);
    }
    for kind in kinds {
        let (result, ms) = timed(|| centrality(&graph, kind, &options));
        let top = result
            .top_n(1)
            .first()
            .map(|(id, score)| format!("top {} = {:.4}", id, score))
            .unwrap_or_default();
        println!("{:<28} {} in {:.1}ms", format!("{} centrality", kind), top, ms);
    }

    if graph.node_count() <= QUADRATIC_LIMIT {
        let (s, ms) = timed(|| stats(&graph));
        println!(
            "{:<28} clustering {:.4}, diameter {:?} in {:.1}ms",
            "stats",
            s.avg_clustering,
            s.diameter,
            ms
        );
    }
    println!();
}

fn report(label: &str, value: Option<usize>, ms: f64) {
    match value {
        Some(v) => println!("{:<28} {} in {:.1}ms", label, v, ms),
        None => println!("{:<28} none ({:.1}ms)", label, ms),
    }
}

// ---------------------------------------------------------------------------
// Topologies: deterministic, O(n + edges)
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

const NODE_KINDS: [&str; 4] = ["server", "database", "cache", "lb"];

fn node_id(i: u64) -> String {
    format!("n{}", i)
}

/// Collects records for a directed model. Every edge gets a weight in [1, 10).
struct Builder {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    rng: FastRng,
}

impl Builder {
    fn new(seed: u64, nodes: u64, edges: u64) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes as usize),
            edges: Vec::with_capacity(edges as usize),
            rng: FastRng::new(seed),
        }
    }

    fn node(&mut self, i: u64, label: &str) {
        let kind = NODE_KINDS[self.rng.next(NODE_KINDS.len() as u64) as usize];
        self.nodes.push(
            NodeRecord::new(node_id(i))
                .with_label(format!("{} {}", label, i))
                .with_attr("type", kind),
        );
    }

    fn edge(&mut self, from: u64, to: u64) {
        let weight = 1.0 + 9.0 * self.rng.next_f64();
        let id = format!("e{}", self.edges.len());
        self.edges
            .push(EdgeRecord::new(node_id(from), node_id(to)).with_id(id).with_weight(weight));
    }

    fn build(self) -> GraphModel {
        match GraphModel::new(true, self.nodes, self.edges) {
            Ok(graph) => graph,
            Err(e) => {
                eprintln!("generator produced an invalid graph: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Each node spawns three children, breadth first. Deep paths, no cycles.
fn gen_tree(node_count: u64) -> GraphModel {
    let mut b = Builder::new(42, node_count, node_count);
    if node_count == 0 {
        return b.build();
    }
    b.node(0, "Root");

    let mut next_id: u64 = 1;
    let mut frontier: Vec<u64> = vec![0];
    while next_id < node_count && !frontier.is_empty() {
        let mut next_frontier = Vec::with_capacity(frontier.len() * 3);
        for &parent in &frontier {
            for _ in 0..3 {
                if next_id >= node_count {
                    break;
                }
                b.node(next_id, "Branch");
                b.edge(parent, next_id);
                next_frontier.push(next_id);
                next_id += 1;
            }
        }
        frontier = next_frontier;
    }

    b.build()
}

/// Preferential attachment by sampling a random endpoint of an existing
/// edge, so hubs attract proportionally more links.
fn gen_scale_free(node_count: u64) -> GraphModel {
    let per_node = 5u64;
    let mut b = Builder::new(12345, node_count, node_count * per_node);
    let mut endpoints: Vec<u64> = Vec::with_capacity((node_count * per_node * 2) as usize);

    let seed = 5u64.min(node_count);
    for i in 0..seed {
        b.node(i, "Seed");
    }
    for i in 0..seed {
        for j in (i + 1)..seed {
            b.edge(i, j);
            endpoints.extend([i, j]);
        }
    }

    for new_node in seed..node_count {
        b.node(new_node, "Host");
        for _ in 0..per_node.min(new_node) {
            if endpoints.is_empty() {
                break;
            }
            let target = endpoints[b.rng.next(endpoints.len() as u64) as usize];
            if target != new_node {
                b.edge(new_node, target);
                endpoints.extend([new_node, target]);
            }
        }
    }

    b.build()
}

/// Ring lattice (k forward neighbours) with each link rewired to a random
/// node with probability p.
fn gen_small_world(node_count: u64) -> GraphModel {
    let k = 4u64;
    let p = 0.05f64;
    let mut b = Builder::new(67890, node_count, node_count * k);

    for i in 0..node_count {
        b.node(i, "Ring");
    }
    for i in 0..node_count {
        for j in 1..=k.min(node_count.saturating_sub(1)) {
            let mut to = (i + j) % node_count;
            if b.rng.next_f64() < p {
                let rewired = b.rng.next(node_count);
                if rewired != i {
                    to = rewired;
                }
            }
            b.edge(i, to);
        }
    }

    b.build()
}

/// Two random clusters joined by a ten-node chain. Every cross-cluster path
/// squeezes through the bridge.
fn gen_barbell(node_count: u64) -> GraphModel {
    let bridge_len = 10u64.min(node_count);
    let cluster = (node_count - bridge_len) / 2;
    let mut b = Builder::new(99999, node_count, cluster * 10 + bridge_len);

    let link_cluster = |b: &mut Builder, start: u64| {
        for i in 0..cluster {
            for _ in 0..5u64.min(cluster.saturating_sub(1)) {
                let target = b.rng.next(cluster);
                if target != i {
                    b.edge(start + i, start + target);
                }
            }
        }
    };

    for i in 0..cluster {
        b.node(i, "West");
    }
    link_cluster(&mut b, 0);

    for i in 0..bridge_len {
        let id = cluster + i;
        b.node(id, "Bridge");
        if id > 0 {
            b.edge(id - 1, id);
        }
    }

    let east = cluster + bridge_len;
    for i in 0..cluster {
        b.node(east + i, "East");
    }
    if cluster > 0 && east > 0 {
        b.edge(east - 1, east);
    }
    link_cluster(&mut b, east);

    b.build()
}

/// Each new node attaches to a recent "surface" node; one in ten also links
/// back to a random older node, closing loops.
fn gen_dla(node_count: u64) -> GraphModel {
    let mut b = Builder::new(77777, node_count, node_count * 2);
    if node_count == 0 {
        return b.build();
    }
    b.node(0, "Seed");

    let surface_max = 1000usize;
    let mut surface: VecDeque<u64> = VecDeque::with_capacity(surface_max + 1);
    surface.push_back(0);

    for new_node in 1..node_count {
        b.node(new_node, "Particle");
        let attach_to = surface[b.rng.next(surface.len() as u64) as usize];
        b.edge(new_node, attach_to);

        if b.rng.next(10) == 0 && new_node > 1 {
            let other = b.rng.next(new_node);
            if other != attach_to {
                b.edge(other, new_node);
            }
        }

        surface.push_back(new_node);
        if surface.len() > surface_max {
            surface.pop_front();
        }
    }

    b.build()
}
