//! Integration tests for atomspace-hypershell
//!
//! End-to-end flows over the public API: build a small knowledge base,
//! decompose it into shells, spread attention, run the orchestrator and
//! query it. Everything runs in memory.
//! Run with: cargo test --test integration_tests

use std::sync::Arc;

use atomspace_hypershell::{
    find_optimal_root, AtomSpace, AtomStore, AtomType, AttentionValue, Handle, HypershellOptions,
    RootSelection, RootedHypershell, RootedTree, RootedTreeEnumerator, ShellBuilder,
    ShellOptions, TruthValue,
};

/// animals ontology:
///
/// ```text
/// cat ─Inh─ mammal ─Inh─ animal
/// dog ─Inh─ mammal
/// cat ─Sim─ dog
/// (Eval likes (List cat fish))
/// ```
struct Ontology {
    space: Arc<AtomSpace>,
    cat: Handle,
    dog: Handle,
    mammal: Handle,
    animal: Handle,
    fish: Handle,
}

fn ontology() -> Ontology {
    let space = Arc::new(AtomSpace::new());
    let cat = space.add_node(AtomType::ConceptNode, "cat");
    let dog = space.add_node(AtomType::ConceptNode, "dog");
    let mammal = space.add_node(AtomType::ConceptNode, "mammal");
    let animal = space.add_node(AtomType::ConceptNode, "animal");
    let fish = space.add_node(AtomType::ConceptNode, "fish");
    let likes = space.add_node(AtomType::PredicateNode, "likes");

    let cat_mammal = space
        .add_link(AtomType::InheritanceLink, vec![cat, mammal])
        .unwrap();
    space
        .add_link(AtomType::InheritanceLink, vec![dog, mammal])
        .unwrap();
    space
        .add_link(AtomType::InheritanceLink, vec![mammal, animal])
        .unwrap();
    space
        .add_link(AtomType::SimilarityLink, vec![cat, dog])
        .unwrap();
    let pair = space.add_link(AtomType::ListLink, vec![cat, fish]).unwrap();
    space
        .add_link(AtomType::EvaluationLink, vec![likes, pair])
        .unwrap();

    space
        .set_truth_value(cat_mammal, TruthValue::new(0.95, 0.9))
        .unwrap();

    Ontology {
        space,
        cat,
        dog,
        mammal,
        animal,
        fish,
    }
}

fn small_options() -> HypershellOptions {
    HypershellOptions {
        embedding_dim: 8,
        hidden_dim: 16,
        ..Default::default()
    }
}

#[test]
fn test_a000081_reference_values() {
    let mut enumerator = RootedTreeEnumerator::new();
    assert_eq!(
        enumerator.sequence(10).unwrap(),
        vec![0, 1, 1, 2, 4, 9, 20, 48, 115, 286, 719]
    );
}

#[test]
fn test_shells_over_ontology() {
    let o = ontology();
    let shells = ShellBuilder::new(o.space.clone(), o.cat, ShellOptions::default()).unwrap();

    assert_eq!(shells.shell(0), &[o.cat]);
    assert_eq!(shells.node_depth(o.mammal), Some(1));
    assert_eq!(shells.node_depth(o.dog), Some(1));
    assert_eq!(shells.node_depth(o.fish), Some(1));
    assert_eq!(shells.node_depth(o.animal), Some(2));
    assert_eq!(shells.total_nodes(), o.space.len());

    for d in 1..=shells.max_depth() {
        for &h in shells.shell(d) {
            let parent = shells.node_parent(h).unwrap();
            assert!(shells.shell(d - 1).contains(&parent));
        }
    }
}

#[test]
fn test_spread_attention_end_to_end() {
    let o = ontology();
    o.space
        .set_attention_value(o.cat, AttentionValue::new(100.0, 3.0, true))
        .unwrap();

    let hs = RootedHypershell::new(o.space.clone(), o.cat, small_options()).unwrap();
    hs.spread_attention(3).unwrap();

    let factor = hs.options().attenuation_factor;
    for d in 1..=hs.max_depth() {
        for &h in hs.shells().shell(d) {
            let sti = o.space.attention_value(h).unwrap().sti;
            assert!((sti - 100.0 * factor.powi(d as i32)).abs() < 1e-9);
        }
    }
    let root = o.space.attention_value(o.cat).unwrap();
    assert_eq!(root, AttentionValue::new(100.0, 3.0, true));
}

#[test]
fn test_forward_backward_and_queries() {
    let o = ontology();
    let mut hs = RootedHypershell::new(o.space.clone(), o.cat, small_options()).unwrap();

    let out = hs.forward(None).unwrap();
    assert_eq!(out.len(), 8);

    let stats = hs.get_stats();
    assert_eq!(stats.shell.max_depth, hs.shells().max_depth());
    assert_eq!(stats.tree.node_count, hs.tree().node_count());
    assert_eq!(stats.tree.root_value, o.cat.to_string());

    let query = out.clone();
    let by_depth = hs.hierarchical_inference(&query).unwrap();
    let total: usize = by_depth.values().map(Vec::len).sum();
    assert_eq!(total, hs.shells().total_nodes());

    let top = hs.get_relevant_nodes(&query, 3).unwrap();
    assert_eq!(top.len(), 3);
    assert!(top[0].relevance >= top[1].relevance);

    hs.zero_grad_parameters().unwrap();
    let grad_in = hs.backward(None, &[1.0; 8]).unwrap();
    assert!(grad_in.iter().all(|g| *g == 0.0));
    assert!(hs.grad_norm().unwrap() > 0.0);
    hs.update_parameters(0.01).unwrap();
    assert_ne!(hs.forward(None).unwrap(), out);
}

#[test]
fn test_forward_dim_for_every_root() {
    let o = ontology();
    for handle in o.space.all_atoms() {
        let mut hs = RootedHypershell::new(o.space.clone(), handle, small_options()).unwrap();
        assert_eq!(hs.forward(None).unwrap().len(), 8, "root {}", handle);
    }
}

#[test]
fn test_root_selection_drives_orchestrator() {
    let o = ontology();
    let store: Arc<dyn AtomStore> = o.space.clone();
    let root = find_optimal_root(store.clone(), RootSelection::Degree)
        .unwrap()
        .unwrap();
    let hs = RootedHypershell::new(store, root, small_options()).unwrap();
    assert_eq!(hs.shells().root(), root);
    assert!(hs.shells().shell(1).len() >= hs.shells().neighbors(o.animal).len());
}

#[test]
fn test_mirrored_tree_renders_and_parses() {
    let o = ontology();
    let hs = RootedHypershell::new(o.space.clone(), o.cat, small_options()).unwrap();
    let rendered = hs.tree().to_string();
    let parsed: RootedTree<String> = rendered.parse().unwrap();
    assert_eq!(parsed.node_count(), hs.tree().node_count());
    assert_eq!(parsed.depth_profile(), hs.tree().depth_profile());
    assert_eq!(parsed.to_string(), rendered);
}

#[test]
fn test_snapshot_restores_same_shells() {
    let o = ontology();
    let restored = Arc::new(AtomSpace::from_json(&o.space.to_json().unwrap()).unwrap());
    let before = ShellBuilder::new(o.space.clone(), o.cat, ShellOptions::default()).unwrap();
    let after = ShellBuilder::new(restored, o.cat, ShellOptions::default()).unwrap();
    assert_eq!(before.all_nodes(), after.all_nodes());
    assert_eq!(before.shell_sizes(), after.shell_sizes());
}
