#[macro_use]
extern crate pretty_assertions;

mod util;

use ndarray::s;
use petcut::{
    Cutter, DataType, DecodeRequest, IndexSelection, Modality, ReaderOptions, ScanError,
    ScanImage, ScanObject, Topology,
};
use std::path::Path;
use util::ScanSpec;

fn decoded(dir: &Path, spec: &ScanSpec, name: &str) -> ScanImage {
    let data_path = spec.write(dir, name);
    let mut image = ReaderOptions::new().read_file(data_path, spec.modality).unwrap();
    let _ = image.decode_all().unwrap();
    image
}

#[test]
fn cross_cut_yields_four_quadrants() {
    let dir = tempfile::tempdir().unwrap();
    let spec = ScanSpec::new(Modality::Pet, DataType::Int16, (128, 128, 2)).frames(&[1., 0.5]);
    let mut image = decoded(dir.path(), &spec, "mouse.pet.img");
    let volume = image.volume().unwrap();
    let parent = volume.to_array();
    let (frame_range, plane_range) = (volume.frame_range(), volume.plane_range());
    let scale_factors = volume.scale_factors().to_vec();
    let params = image.parameters().clone();

    let mut cutter = Cutter::new();
    let _ = cutter.set_center(64, 64);
    let cuts = cutter.cut(&mut image, Some(Topology::Cross)).unwrap();
    assert_eq!(cuts.len(), 4);
    assert_eq!(cuts.topology(), Topology::Cross);
    assert_eq!(cuts.center(), (64, 64));

    let names: Vec<&str> = cuts.iter().map(|c| c.filename()).collect();
    assert_eq!(
        names,
        vec!["mouse_s1.pet.img", "mouse_s2.pet.img", "mouse_s3.pet.img", "mouse_s4.pet.img"]
    );

    // top-left, top-right, bottom-left, bottom-right
    let expected = [
        parent.slice(s![.., 64.., ..64, ..]),
        parent.slice(s![.., 64.., 64.., ..]),
        parent.slice(s![.., ..64, ..64, ..]),
        parent.slice(s![.., ..64, 64.., ..]),
    ];
    for (child, block) in cuts.iter().zip(expected.iter()) {
        let volume = child.volume().unwrap();
        assert_eq!(volume.data().shape(), &[2, 64, 64, 2]);
        assert_eq!(&volume.data(), block);
        assert_eq!(volume.frame_range(), frame_range);
        assert_eq!(volume.plane_range(), plane_range);
        assert!(volume.is_scaled());
        assert_eq!(volume.scale_factors(), &scale_factors[..]);
        assert_eq!(child.parameters(), &params);
        assert!(child.scratch_path().exists());
    }
}

#[test]
fn every_topology_partitions_the_volume() {
    let dir = tempfile::tempdir().unwrap();
    let spec = ScanSpec::new(Modality::Ct, DataType::Uint8, (9, 7, 2)).frames(&[1., 1.]);
    let mut image = decoded(dir.path(), &spec, "ct.img");
    let parent = image.volume().unwrap().to_array();
    let total: f32 = parent.sum();

    let mut cutter = Cutter::new();
    let _ = cutter.set_center(4, 3);
    for &topology in Topology::ALL.iter() {
        let cuts = cutter.cut(&mut image, Some(topology)).unwrap();
        assert_eq!(cuts.len(), topology.child_count());
        let voxels: usize = cuts.iter().map(|c| c.volume().unwrap().data().len()).sum();
        assert_eq!(voxels, parent.len(), "{}", topology);
        let sum: f32 = cuts.iter().map(|c| c.volume().unwrap().data().sum()).sum();
        assert_eq!(sum, total, "{}", topology);
    }
}

#[test]
fn half_cuts_split_at_the_center() {
    let dir = tempfile::tempdir().unwrap();
    let spec = ScanSpec::new(Modality::Ct, DataType::Uint8, (10, 6, 1));
    let mut image = decoded(dir.path(), &spec, "ct.img");

    let mut cutter = Cutter::new();
    let cuts = cutter.cut(&mut image, None).unwrap();
    assert_eq!(cuts.topology(), Topology::Vertical);
    assert_eq!(cuts.center(), (5, 3));
    let dims: Vec<_> = cuts.iter().map(|c| c.dimensions().unwrap()).collect();
    assert_eq!(dims, vec![(5, 6, 1), (5, 6, 1)]);

    let _ = cutter.set_center(2, 4);
    let cuts = cutter.cut(&mut image, Some(Topology::Horizontal)).unwrap();
    let dims: Vec<_> = cuts.iter().map(|c| c.dimensions().unwrap()).collect();
    // top rows first
    assert_eq!(dims, vec![(10, 2, 1), (10, 4, 1)]);
    assert_eq!(cuts.children()[0].volume().unwrap().data()[[0, 0, 0, 0]], spec.raw(0, 0, 4, 0));

    // the last topology given stays selected
    let cuts = cutter.cut(&mut image, None).unwrap();
    assert_eq!(cuts.topology(), Topology::Horizontal);
}

#[test]
fn view_axis_restrictions() {
    let dir = tempfile::tempdir().unwrap();
    let spec = ScanSpec::new(Modality::Ct, DataType::Uint8, (8, 8, 2));
    let mut image = decoded(dir.path(), &spec, "ct.img");

    let mut cutter = Cutter::new();
    let _ = cutter.set_view_axis("x").unwrap();
    for &t in &[Topology::DownT, Topology::UpT, Topology::Cross] {
        match cutter.cut(&mut image, Some(t)) {
            Err(ScanError::IllegalViewAxis(_, 'x')) => {}
            other => panic!("unexpected result {:?}", other),
        }
        // a rejected topology is not remembered
        assert_eq!(cutter.topology(), Topology::Vertical);
        assert!(image.cuts().is_none());
    }
    assert!(cutter.cut(&mut image, Some(Topology::Horizontal)).is_ok());
    assert_eq!(cutter.topology(), Topology::Horizontal);

    let _ = cutter.set_view_axis('y').unwrap();
    assert!(cutter.cut(&mut image, Some(Topology::Vertical)).is_ok());
    assert!(cutter.cut(&mut image, Some(Topology::Horizontal)).is_err());
    assert_eq!(cutter.topology(), Topology::Vertical);
    assert_eq!(image.cuts().unwrap().topology(), Topology::Vertical);
    assert_eq!(cutter.cut(&mut image, None).unwrap().topology(), Topology::Vertical);
    assert!("Cross".parse::<Topology>().is_err());
}

#[test]
fn cut_coordinates_must_be_inside() {
    let dir = tempfile::tempdir().unwrap();
    let spec = ScanSpec::new(Modality::Ct, DataType::Uint8, (8, 6, 1));
    let mut image = decoded(dir.path(), &spec, "ct.img");
    let mut cutter = Cutter::new();

    for &(cx, cy) in &[(0, 3), (8, 3), (20, 3)] {
        let _ = cutter.set_center(cx, cy);
        match cutter.cut(&mut image, Some(Topology::Vertical)) {
            Err(ScanError::InvalidCutCoordinates(..)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }
    // rows are not split by a vertical cut
    let _ = cutter.set_center(4, 0);
    assert!(cutter.cut(&mut image, Some(Topology::Vertical)).is_ok());
    assert!(cutter.cut(&mut image, Some(Topology::Cross)).is_err());
    assert_eq!(cutter.topology(), Topology::Vertical);

    // the previous cut set survives the failed cut
    let cuts = image.cuts().unwrap();
    assert_eq!(cuts.topology(), Topology::Vertical);
    assert_eq!(cuts.center(), (4, 0));
    assert!(cuts.iter().all(|c| c.scratch_path().exists()));
}

#[test]
fn cut_needs_decoded_volume() {
    let dir = tempfile::tempdir().unwrap();
    let spec = ScanSpec::new(Modality::Ct, DataType::Uint8, (8, 6, 1));
    let data_path = spec.write(dir.path(), "ct.img");
    let mut image = ReaderOptions::new().read_file(data_path, Modality::Ct).unwrap();

    match Cutter::new().cut(&mut image, None) {
        Err(ScanError::NoVolumeData) => {}
        other => panic!("unexpected result {:?}", other),
    }
    assert!(image.cuts().is_none());
    match image.require_cuts() {
        Err(ScanError::NotCut) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn recut_and_decode_replace_cut_set() {
    let dir = tempfile::tempdir().unwrap();
    let spec = ScanSpec::new(Modality::Ct, DataType::Int16, (8, 8, 2)).frames(&[1., 1., 1.]);
    let mut image = decoded(dir.path(), &spec, "mouse.ct.img");

    let mut cutter = Cutter::new();
    let scratch: Vec<_> = cutter
        .cut(&mut image, Some(Topology::Cross))
        .unwrap()
        .iter()
        .map(|c| c.scratch_path().to_owned())
        .collect();
    assert!(scratch.iter().all(|p| p.exists()));

    let cuts = cutter.cut(&mut image, Some(Topology::Vertical)).unwrap();
    assert_eq!(cuts.len(), 2);
    assert!(scratch[0].exists());
    assert!(scratch[1].exists());
    assert!(!scratch[2].exists());
    assert!(!scratch[3].exists());

    let request = DecodeRequest {
        frames: IndexSelection::from(1usize),
        ..DecodeRequest::default()
    };
    let _ = image.decode(&request).unwrap();
    assert!(image.cuts().is_none());
    assert!(!scratch[0].exists());

    // children inherit the window of the parent
    let cuts = cutter.cut(&mut image, None).unwrap();
    for child in cuts {
        let volume = child.volume().unwrap();
        assert_eq!(volume.frame_range().bounds(), [1, 1]);
        assert!(volume.get_frame(1).is_ok());
        assert!(volume.get_frame(0).is_err());
    }
    assert!(scratch[0].exists());

    image.clear_cuts();
    assert!(image.cuts().is_none());
    assert!(!scratch[0].exists());
    assert!(image.is_decoded());
}

#[test]
fn rotating_parent_leaves_children_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let spec = ScanSpec::new(Modality::Ct, DataType::Int16, (6, 6, 2));
    let mut image = decoded(dir.path(), &spec, "ct.img");

    let child = Cutter::new().cut(&mut image, None).unwrap().children()[0]
        .volume()
        .unwrap()
        .to_array();
    image.rotate_on_axis("z").unwrap();
    let after = image.cuts().unwrap().children()[0].volume().unwrap();
    assert_eq!(after.data(), child);
}

#[test]
fn failed_decode_keeps_volume_and_cuts() {
    let dir = tempfile::tempdir().unwrap();
    let spec = ScanSpec::new(Modality::Ct, DataType::Int16, (8, 6, 2)).frames(&[1., 2.]);
    let mut image = decoded(dir.path(), &spec, "ct.img");
    let volume = image.volume().unwrap();
    let data = volume.to_array();
    let parent_scratch = volume.scratch_path().to_owned();

    let children: Vec<_> = Cutter::new()
        .cut(&mut image, Some(Topology::Vertical))
        .unwrap()
        .iter()
        .map(|c| (c.scratch_path().to_owned(), c.volume().unwrap().to_array()))
        .collect();

    let bad = DecodeRequest {
        frames: IndexSelection::from(vec![0usize, 1, 2]),
        ..DecodeRequest::default()
    };
    match image.decode(&bad) {
        Err(ScanError::MalformedRange(b)) => assert_eq!(b, vec![0, 1, 2]),
        other => panic!("unexpected result {:?}", other),
    }

    assert!(image.is_decoded());
    assert_eq!(image.volume().unwrap().data(), data);
    assert!(parent_scratch.exists());
    let cuts = image.cuts().unwrap();
    assert_eq!(cuts.len(), 2);
    for (child, (path, voxels)) in cuts.iter().zip(&children) {
        assert_eq!(child.scratch_path(), path.as_path());
        assert!(path.exists());
        assert_eq!(&child.volume().unwrap().data(), voxels);
    }

    // a successful decode replaces both
    let _ = image.decode_all().unwrap();
    assert!(image.cuts().is_none());
    assert!(parent_scratch.exists());
    assert!(children.iter().all(|(p, _)| !p.exists()));
}
