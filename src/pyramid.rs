use crate::all::*;

// Downscaled copies of an image. The full resolution image itself is not
// stored: level 0 refers to the caller's image.
pub struct Pyramid {
  pub levels: Vec<Image>,
}

impl Pyramid {
  pub fn empty() -> Pyramid {
    Pyramid { levels: vec![] }
  }

  // Rebuilds the levels in place, reusing the level buffers of the previous
  // call. Stops early if a level would be narrower than `min_size`.
  pub fn compute(&mut self, image: &Image, level_count: usize, min_size: usize) {
    let mut built = 0;
    for level_ind in 0..level_count {
      let (pw, ph) = if level_ind == 0 {
        (image.width, image.height)
      }
      else {
        (self.levels[level_ind - 1].width, self.levels[level_ind - 1].height)
      };
      if pw / 2 < min_size || ph / 2 < min_size { break }
      if self.levels.len() <= level_ind {
        self.levels.push(Image::empty());
      }
      // Splitting is needed to borrow the parent level non-mutably and the
      // child level mutably.
      let (parents, children) = self.levels.split_at_mut(level_ind);
      let parent = if level_ind > 0 { &parents[level_ind - 1] } else { image };
      downscale(parent, &mut children[0]);
      built += 1;
    }
    self.levels.truncate(built);
  }

  // Number of levels including the full resolution image.
  pub fn len(&self) -> usize {
    self.levels.len() + 1
  }

  pub fn get_level<'a>(&'a self, image: &'a Image, level: usize) -> &'a Image {
    if level == 0 { image } else { &self.levels[level - 1] }
  }
}

// 2x2 box filter. An odd last row or column is dropped.
fn downscale(parent: &Image, child: &mut Image) {
  let w = parent.width / 2;
  let h = parent.height / 2;
  child.resize(w, h);
  for y in 0..h {
    for x in 0..w {
      let sum = parent.value(2 * x, 2 * y) as u16
        + parent.value(2 * x + 1, 2 * y) as u16
        + parent.value(2 * x, 2 * y + 1) as u16
        + parent.value(2 * x + 1, 2 * y + 1) as u16;
      child.set_value(x, y, ((sum + 2) / 4) as u8);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_downscale() {
    let image = Image {
      data: vec![
        0, 4, 8, 8, 1,
        4, 0, 8, 8, 1,
        2, 2, 0, 0, 1,
        2, 2, 0, 4, 1,
        9, 9, 9, 9, 9,
      ],
      width: 5,
      height: 5,
    };
    let mut pyramid = Pyramid::empty();
    pyramid.compute(&image, 3, 1);
    assert_eq!(pyramid.len(), 3);
    assert_eq!(pyramid.levels[0], Image { data: vec![2, 8, 2, 1], width: 2, height: 2 });
    assert_eq!(pyramid.levels[1], Image { data: vec![3], width: 1, height: 1 });
    assert_eq!(pyramid.get_level(&image, 0), &image);
  }

  #[test]
  fn test_min_size_limits_levels() {
    let image = Image::new(64, 48);
    let mut pyramid = Pyramid::empty();
    pyramid.compute(&image, 5, 15);
    // 32x24 is fine, 16x12 is too small.
    assert_eq!(pyramid.len(), 2);
    pyramid.compute(&image, 5, 1);
    assert_eq!(pyramid.len(), 6);
    assert_eq!(pyramid.levels[4].width, 2);
    assert_eq!(pyramid.levels[4].height, 1);
  }
}
