// Returning vectors of engine objects across the C boundary
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use graphbridge_core::capi::{
    gb_vector_wrapper_free, gb_vector_wrapper_get, gb_vector_wrapper_size,
};
use graphbridge_core::{copy_to_id_array, wrap_vector_return, GraphHandle, NDArray};

/// Stand-in for an engine graph object
struct Graph {
    num_nodes: usize,
    edges: NDArray,
    released: Arc<AtomicUsize>,
}

impl Drop for Graph {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

fn graphs(n: usize, released: &Arc<AtomicUsize>) -> Vec<Option<Box<Graph>>> {
    (0..n)
        .map(|i| {
            Some(Box::new(Graph {
                num_nodes: i + 1,
                edges: copy_to_id_array(vec![i as i64; i].as_slice()).unwrap(),
                released: released.clone(),
            }))
        })
        .collect()
}

/// The host sees every graph at the address it was boxed at, in order
#[test]
fn test_host_reads_graph_handles() {
    let released = Arc::new(AtomicUsize::new(0));
    let mut batch = graphs(3, &released);
    batch.insert(1, None);
    let addresses: Vec<usize> = batch
        .iter()
        .map(|g| g.as_deref().map_or(0, |g| g as *const Graph as usize))
        .collect();

    let handle = wrap_vector_return(&mut batch).unwrap().into_handle();
    assert!(batch.is_empty());

    // SAFETY: handle stays live until freed at the end of this block.
    unsafe {
        assert_eq!(gb_vector_wrapper_size(handle), 4);
        for (i, expected) in addresses.iter().enumerate() {
            let graph: GraphHandle = gb_vector_wrapper_get(handle, i);
            assert_eq!(graph as usize, *expected);
        }

        let graph = &*(gb_vector_wrapper_get(handle, 3) as *const Graph);
        assert_eq!(graph.num_nodes, 3);
        assert_eq!(graph.edges.shape(), &[2]);

        assert_eq!(released.load(Ordering::SeqCst), 0);
        gb_vector_wrapper_free(handle);
    }
    assert_eq!(released.load(Ordering::SeqCst), 3);
}

/// Rust callers can take the graphs back without going through raw pointers
#[test]
fn test_reclaim_graphs() {
    let released = Arc::new(AtomicUsize::new(0));
    let mut batch = graphs(2, &released);
    let wrapper = wrap_vector_return(&mut batch).unwrap();

    let first = wrapper.get::<Graph>(0).unwrap().unwrap();
    assert_eq!(first.num_nodes, 1);
    assert!(wrapper.get::<NDArray>(0).is_err());

    let graphs = wrapper.into_vec::<Graph>().unwrap();
    assert_eq!(graphs.len(), 2);
    assert_eq!(released.load(Ordering::SeqCst), 0);
    drop(graphs);
    assert_eq!(released.load(Ordering::SeqCst), 2);
}

#[test]
fn test_empty_return() {
    let mut batch: Vec<Option<Box<Graph>>> = Vec::new();
    let handle = wrap_vector_return(&mut batch).unwrap().into_handle();
    // SAFETY: handle is live until freed.
    unsafe {
        assert_eq!(gb_vector_wrapper_size(handle), 0);
        assert!(gb_vector_wrapper_get(handle, 0).is_null());
        gb_vector_wrapper_free(handle);
    }
}
