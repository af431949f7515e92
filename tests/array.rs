//! Integration tests for executor-tagged arrays

use solvr::prelude::*;
use std::sync::Arc;

fn reference() -> Arc<Executor> {
    Executor::reference()
}

fn host_parallel() -> Arc<Executor> {
    Executor::host_parallel()
}

#[test]
fn test_default_is_detached() {
    let a = Array::<i32>::default();
    assert!(a.executor().is_none());
    assert_eq!(a.len(), 0);
    assert!(a.is_empty());
    assert!(a.as_ptr().is_null());
}

#[test]
fn test_new_is_empty_on_executor() {
    let a = Array::<i32>::new(reference());
    assert!(a.executor().is_some());
    assert_eq!(a.len(), 0);
    assert!(a.as_ptr().is_null());
}

#[test]
fn test_from_slice() {
    let a = Array::from_slice(reference(), &[5i32, 2]).expect("from_slice should succeed");
    assert_eq!(a.len(), 2);
    assert_eq!(a.as_slice().unwrap(), &[5, 2]);
}

#[test]
fn test_from_iter() {
    let a = Array::from_iter(reference(), (0..4).map(|i| i * 3)).expect("from_iter");
    assert_eq!(a.as_slice().unwrap(), &[0, 3, 6, 9]);
}

#[test]
fn test_fill() {
    let mut a = Array::<f64>::with_len(reference(), 3).unwrap();
    a.fill(7.5).unwrap();
    assert_eq!(a.as_slice().unwrap(), &[7.5; 3]);
}

#[test]
fn test_copy_keeps_target_executor() {
    let src = Array::from_slice(reference(), &[1.0f64, 2.0]).unwrap();
    let mut dst = Array::<f64>::new(host_parallel());
    dst.copy_from(&src).expect("copy should succeed");
    assert_eq!(dst.as_slice().unwrap(), &[1.0, 2.0]);
    assert_eq!(dst.executor().unwrap().name(), "host-parallel");
    // Source is untouched.
    assert_eq!(src.as_slice().unwrap(), &[1.0, 2.0]);
}

#[test]
fn test_copy_into_detached_adopts_source_executor() {
    let exec = reference();
    let src = Array::from_slice(Arc::clone(&exec), &[4i64, 5, 6]).unwrap();
    let mut dst = Array::<i64>::default();
    dst.copy_from(&src).unwrap();
    assert!(
        Arc::ptr_eq(dst.executor().unwrap(), &exec),
        "detached target should adopt the source's executor"
    );
    assert_eq!(dst.as_slice().unwrap(), &[4, 5, 6]);
}

#[test]
fn test_copy_from_detached_empties_the_target() {
    let exec = reference();
    let mut dst = Array::from_slice(Arc::clone(&exec), &[1i32, 2, 3]).unwrap();
    dst.copy_from(&Array::default()).unwrap();
    assert_eq!(dst.len(), 0);
    assert!(dst.executor().is_some(), "target keeps its executor");
}

#[test]
fn test_copy_resizes_on_length_mismatch() {
    let src = Array::from_slice(reference(), &[1i32, 2, 3, 4]).unwrap();
    let mut dst = Array::from_slice(reference(), &[9i32]).unwrap();
    dst.copy_from(&src).unwrap();
    assert_eq!(dst.as_slice().unwrap(), &[1, 2, 3, 4]);
}

#[test]
fn test_move_steals_storage_on_same_executor() {
    let exec = reference();
    let src = Array::from_slice(Arc::clone(&exec), &[8.0f32, 9.0]).unwrap();
    let src_ptr = src.as_ptr();
    let mut dst = Array::<f32>::new(exec);
    dst.move_from(src).unwrap();
    assert_eq!(dst.as_ptr(), src_ptr, "same-executor move should not copy");
    assert_eq!(dst.as_slice().unwrap(), &[8.0, 9.0]);
}

#[test]
fn test_move_into_detached_takes_everything() {
    let exec = reference();
    let src = Array::from_slice(Arc::clone(&exec), &[1u8, 2]).unwrap();
    let src_ptr = src.as_ptr();
    let mut dst = Array::<u8>::default();
    dst.move_from(src).unwrap();
    assert_eq!(dst.as_ptr(), src_ptr);
    assert!(Arc::ptr_eq(dst.executor().unwrap(), &exec));
}

#[test]
fn test_move_across_executors_copies() {
    let src = Array::from_slice(reference(), &[3i32, 1]).unwrap();
    let mut dst = Array::<i32>::new(host_parallel());
    dst.move_from(src).unwrap();
    assert_eq!(dst.as_slice().unwrap(), &[3, 1]);
    assert_eq!(dst.executor().unwrap().name(), "host-parallel");
}

#[test]
fn test_move_from_detached_empties_but_keeps_executor() {
    let mut dst = Array::from_slice(reference(), &[1i32, 2]).unwrap();
    dst.move_from(Array::default()).unwrap();
    assert_eq!(dst.len(), 0);
    assert!(dst.executor().is_some());
}

#[test]
fn test_clear_keeps_executor() {
    let mut a = Array::from_slice(reference(), &[1.0f64; 8]).unwrap();
    a.clear();
    assert_eq!(a.len(), 0);
    assert!(a.as_ptr().is_null());
    assert!(a.executor().is_some());
    // The array is reusable after clearing.
    a.resize_and_reset(2).unwrap();
    assert_eq!(a.as_slice().unwrap(), &[0.0, 0.0]);
}

#[test]
fn test_resize_discards_old_contents() {
    let mut a = Array::from_slice(reference(), &[5i32, 6, 7]).unwrap();
    a.resize_and_reset(5).unwrap();
    assert_eq!(a.as_slice().unwrap(), &[0; 5]);
}

#[test]
fn test_resize_detached_fails() {
    let mut a = Array::<i32>::default();
    assert!(a.resize_and_reset(3).is_err());
}

#[test]
fn test_view_writes_land_in_caller_storage() {
    let exec = reference();
    let mut data = [1.0f64, 2.0, 3.0];
    {
        let mut view = unsafe { Array::view(exec, 3, data.as_mut_ptr()) };
        assert!(view.is_view());
        view.as_mut_slice().unwrap()[1] = 20.0;
    }
    // Dropping the view leaves the storage alive and modified.
    assert_eq!(data, [1.0, 20.0, 3.0]);
}

#[test]
fn test_view_copy_requires_matching_length() {
    let exec = reference();
    let mut data = [0i32; 2];
    let mut view = unsafe { Array::view(Arc::clone(&exec), 2, data.as_mut_ptr()) };

    let same_len = Array::from_slice(Arc::clone(&exec), &[7i32, 8]).unwrap();
    view.copy_from(&same_len).expect("in-place write");
    assert_eq!(view.as_slice().unwrap(), &[7, 8]);

    let longer = Array::from_slice(exec, &[1i32, 2, 3]).unwrap();
    assert!(view.copy_from(&longer).is_err(), "views cannot be resized");
}

#[test]
fn test_set_executor_round_trip_preserves_data() {
    let reference = reference();
    let host = host_parallel();
    let mut a = Array::from_slice(Arc::clone(&reference), &[1i64, 4, 9]).unwrap();
    a.set_executor(Arc::clone(&host)).unwrap();
    assert!(Arc::ptr_eq(a.executor().unwrap(), &host));
    a.set_executor(Arc::clone(&reference)).unwrap();
    assert!(Arc::ptr_eq(a.executor().unwrap(), &reference));
    assert_eq!(a.as_slice().unwrap(), &[1, 4, 9]);
}

#[test]
fn test_set_executor_same_executor_is_a_no_op() {
    let exec = reference();
    let mut a = Array::from_slice(Arc::clone(&exec), &[2i32]).unwrap();
    let ptr = a.as_ptr();
    a.set_executor(exec).unwrap();
    assert_eq!(a.as_ptr(), ptr);
}

#[test]
fn test_try_clone_is_deep() {
    let a = Array::from_slice(reference(), &[1.0f64, 2.0]).unwrap();
    let mut b = a.try_clone().unwrap();
    b.as_mut_slice().unwrap()[0] = 10.0;
    assert_eq!(a.as_slice().unwrap(), &[1.0, 2.0]);
    assert_eq!(b.as_slice().unwrap(), &[10.0, 2.0]);
}
