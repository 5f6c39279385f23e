// src/merge.rs
// =============================================================================
// Combines every rendered PDF into <output>/merged.pdf.
//
// Order is a pure function of the set of file paths:
// 1. Group files by their parent directory
// 2. Sort the groups by directory (plain string order)
// 3. Sort the files inside a group by full path
// 4. Concatenate group after group
//
// So for {/a/b/p2, /a/p1, /b/p3} the order is /a/p1, /a/b/p2, /b/p3.
//
// The concatenation itself follows the usual lopdf recipe: renumber each
// document so object ids don't collide, keep one catalog and one page tree,
// and hang every page under that tree.
// =============================================================================

use jwalk::WalkDir;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::MergeError;

pub const MERGED_FILE_NAME: &str = "merged.pdf";

/// Result of a successful merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub merged_path: PathBuf,
    pub artifacts: usize,
}

// Finds every PDF under `root`, recursively
//
// A merged.pdf left at the root by an earlier run is not an artifact.
pub fn collect_artifacts(root: &Path) -> Result<Vec<PathBuf>, MergeError> {
    let previous_merge = root.join(MERGED_FILE_NAME);
    let mut found = Vec::new();

    for entry in WalkDir::new(root).skip_hidden(false).follow_links(false) {
        let entry = entry.map_err(|source| {
            let path = source.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
            MergeError::Scan { path, source }
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == "pdf")
            && path != previous_merge
        {
            found.push(path);
        }
    }
    Ok(found)
}

// Orders artifacts for concatenation (see the header comment)
pub fn merge_order(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut groups: BTreeMap<String, Vec<(String, PathBuf)>> = BTreeMap::new();
    for path in paths {
        let parent = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = path.to_string_lossy().into_owned();
        groups.entry(parent).or_default().push((key, path));
    }

    groups
        .into_values()
        .flat_map(|mut group| {
            group.sort_by(|a, b| a.0.cmp(&b.0));
            group.into_iter().map(|(_, path)| path)
        })
        .collect()
}

// Scans, orders and concatenates the artifacts under `output_root`
pub fn merge_artifacts(output_root: &Path) -> Result<MergeOutcome, MergeError> {
    let artifacts = merge_order(collect_artifacts(output_root)?);
    if artifacts.is_empty() {
        return Err(MergeError::NoArtifacts(output_root.to_path_buf()));
    }
    info!("Merging {} PDF(s)", artifacts.len());

    let documents = artifacts
        .iter()
        .map(|path| {
            debug!("Appending {}", path.display());
            Document::load(path).map_err(|source| MergeError::Load {
                path: path.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut merged = concatenate(documents)?;
    let merged_path = output_root.join(MERGED_FILE_NAME);
    merged.save(&merged_path)?;

    Ok(MergeOutcome {
        merged_path,
        artifacts: artifacts.len(),
    })
}

// Concatenates documents page by page, in the given order
fn concatenate(documents: Vec<Document>) -> Result<Document, MergeError> {
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Object)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for page_id in doc.get_pages().into_values() {
            if let Ok(page) = doc.get_object(page_id) {
                pages.push((page_id, page.to_owned()));
            }
        }
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Object)> = None;
    let mut page_tree: Option<(ObjectId, Object)> = None;

    for (object_id, object) in objects {
        let kind = object.type_name().unwrap_or_default().to_string();
        match kind.as_str() {
            "Catalog" => {
                let id = catalog.as_ref().map_or(object_id, |(id, _)| *id);
                catalog = Some((id, object));
            }
            "Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, Object::Dictionary(previous))) = &page_tree {
                        dictionary.extend(previous);
                    }
                    let id = page_tree.as_ref().map_or(object_id, |(id, _)| *id);
                    page_tree = Some((id, Object::Dictionary(dictionary)));
                }
            }
            // Pages are re-inserted below; outlines point into the old trees
            "Page" | "Outlines" | "Outline" => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (tree_id, tree) = page_tree.ok_or(MergeError::MissingPageTree)?;
    let (catalog_id, catalog) = catalog.ok_or(MergeError::MissingCatalog)?;

    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    let page_count = pages.len() as i64;

    for (page_id, page) in pages {
        if let Ok(dictionary) = page.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", tree_id);
            merged.objects.insert(page_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = tree.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.remove(b"Parent");
        dictionary.set("Count", page_count);
        dictionary.set("Kids", Object::Array(kids));
        merged.objects.insert(tree_id, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", tree_id);
        dictionary.remove(b"Outlines");
        merged.objects.insert(catalog_id, Object::Dictionary(dictionary));
    }

    merged.trailer.set("Root", catalog_id);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.adjust_zero_pages();
    merged.compress();
    Ok(merged)
}

// Writes a PDF with `pages` empty A4 pages, creating parent directories
#[cfg(test)]
pub(crate) fn write_test_pdf(path: &Path, pages: usize) {
    use lopdf::{dictionary, Stream};

    let mut doc = Document::with_version("1.5");
    let tree_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => tree_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            });
            page_id.into()
        })
        .collect();
    doc.objects.insert(
        tree_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => tree_id,
    });
    doc.trailer.set("Root", catalog_id);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    doc.save(path).unwrap();
}
